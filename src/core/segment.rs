// ActLens - core/segment.rs
//
// Workflow / job / step boundary detection over raw log text.
// Core layer: pure line classification plus a small state machine.
// Failure extraction is NOT done here; see core::analyzer.
//
// Two banner dialects are recognised:
//
//   act output, one scope prefix per line:
//     [CI/build] ⭐ Run Main Install deps
//     [CI/build]   | npm ERR! missing script
//     [CI/build]   ❌  Failure - Main Install deps [1.2s]
//     [CI/build] exitcode '1': failure
//     [CI/build] 🏁  Job failed
//
//   plain banners (hand-written or other runners):
//     === Workflow: CI ===
//     Job: build
//     Step: install
//     ##[group]Run npm ci
//
// States: OutsideWorkflow -> InWorkflow -> InJob -> InStep. A scoped act
// line jumps straight to its (workflow, job), creating either if needed, so
// interleaved output from parallel jobs lands in the right segment. Lines
// with no structural meaning are body lines of whatever is current.
// `finish` closes every step still open so nothing is dropped.

use crate::core::extractor::strip_ansi;
use crate::util::constants;
use regex::Regex;
use std::sync::OnceLock;

// =============================================================================
// Segments (state machine output)
// =============================================================================

/// One step as seen in the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSegment {
    pub name: String,
    /// From the step's end marker; `None` when the log never closed it.
    pub success: Option<bool>,
    /// Seconds, from the end marker when it carried one.
    pub duration: f64,
    pub output: Vec<String>,
    /// A non-zero exit marker was seen while this step was open.
    pub exit_failed: bool,
}

/// One job as seen in the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSegment {
    pub name: String,
    /// Every body line of the job, in order. Input to failure extraction.
    pub body: Vec<String>,
    /// 1-based log line number of each `body` line.
    pub body_lines: Vec<usize>,
    pub steps: Vec<StepSegment>,
    /// From a `Job succeeded` / `Job failed` marker.
    pub ended: Option<bool>,
    /// A non-zero exit marker was seen inside this job.
    pub exit_failed: bool,
    open_step: Option<StepSegment>,
}

impl JobSegment {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn close_step(&mut self) {
        if let Some(step) = self.open_step.take() {
            self.steps.push(step);
        }
    }
}

/// One workflow as seen in the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSegment {
    pub name: String,
    /// Body lines seen after the workflow banner but outside any job.
    pub preamble: Vec<String>,
    /// 1-based log line number of each `preamble` line.
    pub preamble_lines: Vec<usize>,
    pub jobs: Vec<JobSegment>,
    /// A non-zero exit marker was seen outside any job of this workflow.
    pub exit_failed: bool,
}

impl WorkflowSegment {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Everything the state machine found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSegments {
    /// Body lines seen before any workflow or job banner.
    pub preamble: Vec<String>,
    /// 1-based log line number of each `preamble` line.
    pub preamble_lines: Vec<usize>,
    /// A non-zero exit marker was seen in the preamble.
    pub preamble_exit_failed: bool,
    pub workflows: Vec<WorkflowSegment>,
}

// =============================================================================
// Line classification
// =============================================================================

/// Structural meaning of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    WorkflowBanner(&'a str),
    JobBanner(&'a str),
    StepStart(&'a str),
    StepEnd {
        name: &'a str,
        success: bool,
        duration: f64,
    },
    JobEnd {
        success: bool,
    },
    /// Recognised tool chatter with no body content (e.g. `exitcode` lines).
    Marker,
    /// Ordinary output.
    Body(&'a str),
}

/// A classified line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineEvent<'a> {
    /// `(workflow, job)` from an act scope prefix.
    pub scope: Option<(&'a str, &'a str)>,
    pub kind: LineKind<'a>,
    /// The line carries an explicit non-zero exit code.
    pub nonzero_exit: bool,
}

struct BannerPatterns {
    act_prefix: Regex,
    act_output: Regex,
    act_step_start: Regex,
    act_step_end: Regex,
    act_job_end: Regex,
    act_exit: Regex,
    workflow: Regex,
    job: Regex,
    step: Regex,
    group_run: Regex,
    group_marker: Regex,
    exit_code: Regex,
    go_duration: Regex,
    go_duration_part: Regex,
}

impl BannerPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            act_prefix: Regex::new(
                r"^\[(?P<workflow>[^\]/]+)/(?P<job>[^\]]+)\]\s*(?P<rest>.*)$",
            )?,
            act_output: Regex::new(r"^\|\s?(?P<text>.*)$")?,
            act_step_start: Regex::new(
                r"^⭐\s*Run\s+(?:(?:Main|Pre|Post)\s+)?(?P<name>.+?)\s*$",
            )?,
            act_step_end: Regex::new(
                r"^(?:✅|❌)\s*(?P<status>Success|Failure)\s*-\s*(?:(?:Main|Pre|Post)\s+)?(?P<name>.+?)(?:\s*\[(?P<duration>[0-9.hmsuµn]+)\])?\s*$",
            )?,
            act_job_end: Regex::new(r"^🏁\s*Job (?P<status>succeeded|failed)")?,
            act_exit: Regex::new(r"^exitcode '\d+'")?,
            workflow: Regex::new(
                r"^\s*(?:[=#*-]+\s*)?Workflow:\s*(?P<name>.+?)(?:\s+[=#*-]+)?\s*$",
            )?,
            job: Regex::new(r"^\s*(?:[=#*-]+\s*)?Job:\s*(?P<name>.+?)(?:\s+[=#*-]+)?\s*$")?,
            step: Regex::new(
                r"^\s*(?:[=#*-]+\s*)?Step:\s*(?P<name>.+?)(?:\s+[=#*-]+)?\s*$",
            )?,
            group_run: Regex::new(r"^##\[group\]Run\s+(?P<name>.+?)\s*$")?,
            group_marker: Regex::new(r"^##\[(?:group|endgroup)\]")?,
            exit_code: Regex::new(
                r"(?:exitcode '(?P<act>\d+)'|Process completed with exit code (?P<gh>\d+))",
            )?,
            go_duration: Regex::new(r"^(?:\d+(?:\.\d+)?(?:ns|us|µs|ms|s|m|h))+$")?,
            go_duration_part: Regex::new(r"(?P<n>\d+(?:\.\d+)?)(?P<unit>ns|us|µs|ms|s|m|h)")?,
        })
    }
}

fn banner_patterns() -> Option<&'static BannerPatterns> {
    static PATTERNS: OnceLock<Option<BannerPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            BannerPatterns::compile()
                .map_err(|e| tracing::error!(error = %e, "Failed to compile banner patterns"))
                .ok()
        })
        .as_ref()
}

/// Classify one (ANSI-free) line.
pub fn classify_line(line: &str) -> LineEvent<'_> {
    let Some(pats) = banner_patterns() else {
        return LineEvent {
            scope: None,
            kind: LineKind::Body(line),
            nonzero_exit: false,
        };
    };

    let nonzero_exit = pats.exit_code.captures(line).is_some_and(|caps| {
        caps.name("act")
            .or_else(|| caps.name("gh"))
            // Digits only, so a parse failure means overflow: still non-zero.
            .map(|m| m.as_str().parse::<u64>().map_or(true, |code| code != 0))
            .unwrap_or(false)
    });

    if let Some(caps) = pats.act_prefix.captures(line) {
        let (Some(workflow), Some(job), Some(rest)) =
            (caps.name("workflow"), caps.name("job"), caps.name("rest"))
        else {
            return LineEvent {
                scope: None,
                kind: LineKind::Body(line),
                nonzero_exit,
            };
        };
        return LineEvent {
            scope: Some((workflow.as_str().trim(), job.as_str().trim())),
            kind: classify_act_rest(rest.as_str(), pats),
            nonzero_exit,
        };
    }

    LineEvent {
        scope: None,
        kind: classify_plain(line, pats),
        nonzero_exit,
    }
}

fn classify_act_rest<'a>(rest: &'a str, pats: &BannerPatterns) -> LineKind<'a> {
    if let Some(text) = pats.act_output.captures(rest).and_then(|c| c.name("text")) {
        return LineKind::Body(text.as_str());
    }
    if let Some(name) = pats.act_step_start.captures(rest).and_then(|c| c.name("name")) {
        return LineKind::StepStart(name.as_str());
    }
    if let Some(caps) = pats.act_step_end.captures(rest) {
        if let Some(name) = caps.name("name") {
            let success = caps.name("status").is_some_and(|s| s.as_str() == "Success");
            let duration = caps
                .name("duration")
                .and_then(|d| parse_go_duration(d.as_str()))
                .unwrap_or(0.0);
            return LineKind::StepEnd {
                name: name.as_str(),
                success,
                duration,
            };
        }
    }
    if let Some(status) = pats.act_job_end.captures(rest).and_then(|c| c.name("status")) {
        return LineKind::JobEnd {
            success: status.as_str() == "succeeded",
        };
    }
    if pats.act_exit.is_match(rest) {
        return LineKind::Marker;
    }
    LineKind::Body(rest)
}

fn classify_plain<'a>(line: &'a str, pats: &BannerPatterns) -> LineKind<'a> {
    let name_of = |re: &Regex| {
        re.captures(line)
            .and_then(|c| c.name("name"))
            .map(|m| m.as_str())
    };

    if let Some(name) = name_of(&pats.workflow) {
        return LineKind::WorkflowBanner(name);
    }
    if let Some(name) = name_of(&pats.job) {
        return LineKind::JobBanner(name);
    }
    if let Some(name) = name_of(&pats.step).or_else(|| name_of(&pats.group_run)) {
        return LineKind::StepStart(name);
    }
    if pats.group_marker.is_match(line) {
        return LineKind::Marker;
    }
    LineKind::Body(line)
}

/// Parse a Go-style duration (`1m2.5s`, `340ms`, `2h`) into seconds.
pub fn parse_go_duration(text: &str) -> Option<f64> {
    let pats = banner_patterns()?;
    if !pats.go_duration.is_match(text) {
        return None;
    }
    let mut total = 0.0;
    for caps in pats.go_duration_part.captures_iter(text) {
        let value: f64 = caps.name("n")?.as_str().parse().ok()?;
        total += match caps.name("unit")?.as_str() {
            "ns" => value / 1e9,
            "us" | "µs" => value / 1e6,
            "ms" => value / 1e3,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            _ => return None,
        };
    }
    // Absurd digit runs overflow to infinity, which JSON cannot carry.
    total.is_finite().then_some(total)
}

// =============================================================================
// State machine
// =============================================================================

/// Position of the segmenter in the workflow structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    OutsideWorkflow,
    InWorkflow,
    InJob,
    InStep,
}

/// Incremental boundary detector. Feed lines in order, then `finish`.
#[derive(Debug)]
pub struct Segmenter {
    state: SegmentState,
    segments: LogSegments,
    workflow: Option<usize>,
    job: Option<usize>,
    /// Lines fed so far; the 1-based number of the current line.
    line_no: usize,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            state: SegmentState::OutsideWorkflow,
            segments: LogSegments::default(),
            workflow: None,
            job: None,
            line_no: 0,
        }
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// Process one raw log line.
    pub fn feed(&mut self, raw_line: &str) {
        self.line_no += 1;
        let line = strip_ansi(raw_line);
        let event = classify_line(&line);

        if let Some((workflow, job)) = event.scope {
            self.enter_scope(workflow, job);
        }

        match event.kind {
            LineKind::WorkflowBanner(name) => self.open_workflow(name),
            LineKind::JobBanner(name) => self.open_job(name),
            LineKind::StepStart(name) => self.start_step(name),
            LineKind::StepEnd {
                name,
                success,
                duration,
            } => self.end_step(name, success, duration),
            LineKind::JobEnd { success } => self.end_job(success),
            LineKind::Marker => {}
            LineKind::Body(text) => self.push_body(text),
        }

        if event.nonzero_exit {
            self.mark_exit_failure();
        }
    }

    /// Close everything still open and hand back the segments.
    pub fn finish(mut self) -> LogSegments {
        for workflow in &mut self.segments.workflows {
            for job in &mut workflow.jobs {
                job.close_step();
            }
        }
        tracing::debug!(
            workflows = self.segments.workflows.len(),
            final_state = ?self.state,
            "Segmentation complete"
        );
        self.segments
    }

    // -- transitions ---------------------------------------------------------

    fn open_workflow(&mut self, name: &str) {
        self.leave_job();
        self.segments.workflows.push(WorkflowSegment::new(name));
        self.workflow = Some(self.segments.workflows.len() - 1);
        self.state = SegmentState::InWorkflow;
    }

    fn open_job(&mut self, name: &str) {
        self.leave_job();
        let wf = self.ensure_workflow();
        let jobs = &mut self.segments.workflows[wf].jobs;
        jobs.push(JobSegment::new(name));
        self.job = Some(jobs.len() - 1);
        self.state = SegmentState::InJob;
    }

    fn enter_scope(&mut self, workflow: &str, job: &str) {
        let wf = match self
            .segments
            .workflows
            .iter()
            .position(|w| w.name == workflow)
        {
            Some(idx) => idx,
            None => {
                self.segments.workflows.push(WorkflowSegment::new(workflow));
                self.segments.workflows.len() - 1
            }
        };
        let jobs = &mut self.segments.workflows[wf].jobs;
        let jb = match jobs.iter().position(|j| j.name == job) {
            Some(idx) => idx,
            None => {
                jobs.push(JobSegment::new(job));
                jobs.len() - 1
            }
        };

        self.workflow = Some(wf);
        self.job = Some(jb);
        self.state = if jobs[jb].open_step.is_some() {
            SegmentState::InStep
        } else {
            SegmentState::InJob
        };
    }

    fn start_step(&mut self, name: &str) {
        let job = self.ensure_job();
        job.close_step();
        job.open_step = Some(StepSegment {
            name: name.to_string(),
            ..Default::default()
        });
        self.state = SegmentState::InStep;
    }

    fn end_step(&mut self, name: &str, success: bool, duration: f64) {
        let job = self.ensure_job();
        let mut step = job.open_step.take().unwrap_or_else(|| StepSegment {
            name: name.to_string(),
            ..Default::default()
        });
        step.success = Some(success);
        step.duration = duration.max(0.0);
        job.steps.push(step);
        self.state = SegmentState::InJob;
    }

    fn end_job(&mut self, success: bool) {
        if let Some(job) = self.current_job_mut() {
            job.close_step();
            job.ended = Some(success);
        }
        self.job = None;
        self.state = if self.workflow.is_some() {
            SegmentState::InWorkflow
        } else {
            SegmentState::OutsideWorkflow
        };
    }

    fn push_body(&mut self, text: &str) {
        let number = self.line_no;
        match self.state {
            SegmentState::InStep | SegmentState::InJob => {
                if let Some(job) = self.current_job_mut() {
                    job.body.push(text.to_string());
                    job.body_lines.push(number);
                    if let Some(step) = job.open_step.as_mut() {
                        step.output.push(text.to_string());
                    }
                }
            }
            SegmentState::InWorkflow => {
                if let Some(wf) = self.workflow {
                    let workflow = &mut self.segments.workflows[wf];
                    workflow.preamble.push(text.to_string());
                    workflow.preamble_lines.push(number);
                }
            }
            SegmentState::OutsideWorkflow => {
                self.segments.preamble.push(text.to_string());
                self.segments.preamble_lines.push(number);
            }
        }
    }

    fn mark_exit_failure(&mut self) {
        match self.state {
            SegmentState::InStep | SegmentState::InJob => {
                if let Some(job) = self.current_job_mut() {
                    job.exit_failed = true;
                    if let Some(step) = job.open_step.as_mut() {
                        step.exit_failed = true;
                    }
                }
            }
            SegmentState::InWorkflow => {
                if let Some(wf) = self.workflow {
                    self.segments.workflows[wf].exit_failed = true;
                }
            }
            SegmentState::OutsideWorkflow => self.segments.preamble_exit_failed = true,
        }
    }

    // -- helpers -------------------------------------------------------------

    /// Close the open step of the current job and drop back to the workflow.
    fn leave_job(&mut self) {
        if let Some(job) = self.current_job_mut() {
            job.close_step();
        }
        self.job = None;
    }

    fn ensure_workflow(&mut self) -> usize {
        match self.workflow {
            Some(wf) => wf,
            None => {
                self.segments
                    .workflows
                    .push(WorkflowSegment::new(constants::IMPLICIT_WORKFLOW_NAME));
                let wf = self.segments.workflows.len() - 1;
                self.workflow = Some(wf);
                wf
            }
        }
    }

    fn ensure_job(&mut self) -> &mut JobSegment {
        if self.job.is_none() {
            let wf = self.ensure_workflow();
            let jobs = &mut self.segments.workflows[wf].jobs;
            jobs.push(JobSegment::new(constants::IMPLICIT_JOB_NAME));
            self.job = Some(jobs.len() - 1);
        }
        let (wf, jb) = (self.ensure_workflow(), self.job.unwrap_or(0));
        &mut self.segments.workflows[wf].jobs[jb]
    }

    fn current_job_mut(&mut self) -> Option<&mut JobSegment> {
        let (wf, jb) = (self.workflow?, self.job?);
        self.segments.workflows.get_mut(wf)?.jobs.get_mut(jb)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the state machine over a whole log.
pub fn segment_log(text: &str) -> LogSegments {
    let mut segmenter = Segmenter::new();
    for line in text.lines() {
        segmenter.feed(line);
    }
    segmenter.finish()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_act_lines() {
        let ev = classify_line("[CI/build]   | npm test");
        assert_eq!(ev.scope, Some(("CI", "build")));
        assert_eq!(ev.kind, LineKind::Body("npm test"));

        let ev = classify_line("[CI/build] ⭐ Run Main Install deps");
        assert_eq!(ev.kind, LineKind::StepStart("Install deps"));

        let ev = classify_line("[CI/build]   ❌  Failure - Main Install deps [1m2.5s]");
        assert_eq!(
            ev.kind,
            LineKind::StepEnd {
                name: "Install deps",
                success: false,
                duration: 62.5
            }
        );

        let ev = classify_line("[CI/build]   ✅  Success - Main actions/checkout@v4");
        assert_eq!(
            ev.kind,
            LineKind::StepEnd {
                name: "actions/checkout@v4",
                success: true,
                duration: 0.0
            }
        );

        let ev = classify_line("[CI/build] exitcode '2': failure");
        assert_eq!(ev.kind, LineKind::Marker);
        assert!(ev.nonzero_exit);

        let ev = classify_line("[CI/build] 🏁  Job succeeded");
        assert_eq!(ev.kind, LineKind::JobEnd { success: true });
    }

    #[test]
    fn test_classify_plain_banners() {
        assert_eq!(
            classify_line("=== Workflow: Release ===").kind,
            LineKind::WorkflowBanner("Release")
        );
        assert_eq!(
            classify_line("Job: build-and-test").kind,
            LineKind::JobBanner("build-and-test")
        );
        assert_eq!(
            classify_line("--- Step: lint ---").kind,
            LineKind::StepStart("lint")
        );
        assert_eq!(
            classify_line("##[group]Run cargo test").kind,
            LineKind::StepStart("cargo test")
        );
        assert_eq!(classify_line("##[endgroup]").kind, LineKind::Marker);
        assert_eq!(classify_line("just output").kind, LineKind::Body("just output"));
    }

    #[test]
    fn test_exit_code_detection() {
        assert!(classify_line("Process completed with exit code 1.").nonzero_exit);
        assert!(!classify_line("Process completed with exit code 0.").nonzero_exit);
        assert!(classify_line("exitcode '99999999999999999999999': failure").nonzero_exit);
        assert!(!classify_line("exit code mentioned casually").nonzero_exit);
    }

    #[test]
    fn test_parse_go_duration() {
        assert_eq!(parse_go_duration("1.5s"), Some(1.5));
        assert_eq!(parse_go_duration("2m3s"), Some(123.0));
        assert_eq!(parse_go_duration("250ms"), Some(0.25));
        assert_eq!(parse_go_duration("1h"), Some(3600.0));
        assert_eq!(parse_go_duration("fast"), None);
        assert_eq!(parse_go_duration(""), None);

        let huge = format!("{}s", "9".repeat(400));
        assert_eq!(parse_go_duration(&huge), None);
        let line = format!("[CI/b]   ✅  Success - Main b [{huge}]");
        let ev = classify_line(&line);
        assert!(matches!(ev.kind, LineKind::StepEnd { duration, .. } if duration == 0.0));
    }

    #[test]
    fn test_state_transitions() {
        let mut seg = Segmenter::new();
        assert_eq!(seg.state(), SegmentState::OutsideWorkflow);
        seg.feed("Workflow: CI");
        assert_eq!(seg.state(), SegmentState::InWorkflow);
        seg.feed("Job: test");
        assert_eq!(seg.state(), SegmentState::InJob);
        seg.feed("Step: run tests");
        assert_eq!(seg.state(), SegmentState::InStep);
        seg.feed("Error: boom");
        seg.feed("Workflow: Deploy");
        assert_eq!(seg.state(), SegmentState::InWorkflow);

        let segments = seg.finish();
        assert_eq!(segments.workflows.len(), 2);
        let job = &segments.workflows[0].jobs[0];
        assert_eq!(job.name, "test");
        assert_eq!(job.body, vec!["Error: boom"]);
        assert_eq!(job.steps.len(), 1);
        assert_eq!(job.steps[0].output, vec!["Error: boom"]);
        assert_eq!(job.steps[0].success, None);
    }

    #[test]
    fn test_act_job_end_returns_to_workflow() {
        let mut seg = Segmenter::new();
        seg.feed("[CI/build] ⭐ Run Main build");
        assert_eq!(seg.state(), SegmentState::InStep);
        seg.feed("[CI/build]   ✅  Success - Main build [2s]");
        assert_eq!(seg.state(), SegmentState::InJob);
        seg.feed("[CI/build] 🏁  Job succeeded");
        assert_eq!(seg.state(), SegmentState::InWorkflow);

        let segments = seg.finish();
        let job = &segments.workflows[0].jobs[0];
        assert_eq!(job.ended, Some(true));
        assert_eq!(job.steps[0].duration, 2.0);
        assert_eq!(job.steps[0].success, Some(true));
    }

    #[test]
    fn test_interleaved_jobs_are_separated() {
        let log = "[CI/lint] ⭐ Run Main lint\n\
                   [CI/test] ⭐ Run Main test\n\
                   [CI/lint]   | lint ok\n\
                   [CI/test]   | Error: test broke\n\
                   [CI/lint]   ✅  Success - Main lint\n";
        let segments = segment_log(log);
        assert_eq!(segments.workflows.len(), 1);
        let jobs = &segments.workflows[0].jobs;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "lint");
        assert_eq!(jobs[0].body, vec!["lint ok"]);
        assert_eq!(jobs[1].name, "test");
        assert_eq!(jobs[1].body, vec!["Error: test broke"]);
        assert_eq!(jobs[0].body_lines, vec![3]);
        assert_eq!(jobs[1].body_lines, vec![4]);
        // The test step was never closed but is flushed at end of log.
        assert_eq!(jobs[1].steps.len(), 1);
        assert_eq!(jobs[1].steps[0].output, vec!["Error: test broke"]);
    }

    #[test]
    fn test_preambles_are_kept() {
        let log = "setting up\nWorkflow: CI\nloading matrix\nJob: a\nok";
        let segments = segment_log(log);
        assert_eq!(segments.preamble, vec!["setting up"]);
        assert_eq!(segments.workflows[0].preamble, vec!["loading matrix"]);
        assert_eq!(segments.workflows[0].jobs[0].body, vec!["ok"]);
        assert_eq!(segments.preamble_lines, vec![1]);
        assert_eq!(segments.workflows[0].preamble_lines, vec![3]);
        assert_eq!(segments.workflows[0].jobs[0].body_lines, vec![5]);
    }

    #[test]
    fn test_step_without_job_opens_implicit_job() {
        let segments = segment_log("Step: compile\nerror: linker failed");
        let wf = &segments.workflows[0];
        assert_eq!(wf.name, constants::IMPLICIT_WORKFLOW_NAME);
        assert_eq!(wf.jobs[0].name, constants::IMPLICIT_JOB_NAME);
        assert_eq!(wf.jobs[0].steps[0].name, "compile");
    }

    #[test]
    fn test_exit_markers_are_attributed() {
        let log = "Process completed with exit code 3\n\
                   Workflow: W\n\
                   Process completed with exit code 4\n\
                   Job: j\n\
                   Step: s\n\
                   Process completed with exit code 5";
        let segments = segment_log(log);
        assert!(segments.preamble_exit_failed);
        assert!(segments.workflows[0].exit_failed);
        let job = &segments.workflows[0].jobs[0];
        assert!(job.exit_failed);
        assert!(job.steps[0].exit_failed);
    }
}
