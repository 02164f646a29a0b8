// ActLens - core/analyzer.rs
//
// Turns raw log text into an ExecutionResult tree, and compares two results.
// Core layer: segmentation and extraction are delegated; this module only
// applies the roll-up rules.
//
// Roll-up:
//   step     success from its end marker, else "no non-zero exit seen inside"
//   job      success iff no extracted failures, no non-zero exit, no failed
//            step, and no "Job failed" marker; duration = sum of steps
//   workflow success iff every job succeeded and no non-zero exit was seen
//            outside its jobs; duration = sum of jobs
//   run      success iff every workflow succeeded; duration = sum
//
// Lines outside any job are not lost: they form an implicit job (and, at top
// level, an implicit workflow) when they hold failures, or when there is no
// other structure to put them in.

use crate::core::extractor::{extract_numbered, ExtractConfig};
use crate::core::model::{
    ExecutionDiff, ExecutionResult, Failure, FailureType, JobResult, StepResult, WorkflowResult,
};
use crate::core::patterns::PatternCatalog;
use crate::core::segment::{self, JobSegment, StepSegment, WorkflowSegment};
use crate::util::constants;
use std::collections::HashSet;

/// Analyse a complete CI log.
///
/// Total over all input: an empty log yields a successful result with no
/// workflows.
pub fn analyze_log(
    log_text: &str,
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> ExecutionResult {
    let segments = segment::segment_log(log_text);

    let mut workflows: Vec<WorkflowResult> = segments
        .workflows
        .iter()
        .map(|w| build_workflow(w, catalog, config))
        .collect();

    if let Some(job) = implicit_job(
        &segments.preamble,
        &segments.preamble_lines,
        segments.preamble_exit_failed,
        workflows.is_empty(),
        catalog,
        config,
    ) {
        workflows.insert(
            0,
            WorkflowResult {
                name: constants::IMPLICIT_WORKFLOW_NAME.to_string(),
                success: job.success,
                duration: job.duration,
                jobs: vec![job],
            },
        );
    }

    let success = workflows.iter().all(|w| w.success);
    let total_duration = finite_sum(workflows.iter().map(|w| w.duration));
    let result = ExecutionResult::new(success, workflows, total_duration);

    tracing::debug!(
        workflows = result.workflows.len(),
        failures = result.total_failures(),
        success = result.success,
        total_duration,
        "Log analysed"
    );

    result
}

/// Compare a run against a baseline by `(type, message)`.
///
/// Within each list an identity appears once. `new_errors` and
/// `persistent_errors` keep current-run order and records; `resolved_errors`
/// keeps baseline order and records.
pub fn compare_execution_results(
    current: &ExecutionResult,
    baseline: &ExecutionResult,
) -> ExecutionDiff {
    let current_keys: HashSet<(FailureType, &str)> =
        current.all_failures().map(Failure::key).collect();
    let baseline_keys: HashSet<(FailureType, &str)> =
        baseline.all_failures().map(Failure::key).collect();

    let mut diff = ExecutionDiff::default();

    let mut seen = HashSet::new();
    for failure in current.all_failures() {
        let key = failure.key();
        if !seen.insert(key) {
            continue;
        }
        if baseline_keys.contains(&key) {
            diff.persistent_errors.push(failure.clone());
        } else {
            diff.new_errors.push(failure.clone());
        }
    }

    let mut seen = HashSet::new();
    for failure in baseline.all_failures() {
        let key = failure.key();
        if seen.insert(key) && !current_keys.contains(&key) {
            diff.resolved_errors.push(failure.clone());
        }
    }

    tracing::debug!(
        new = diff.new_errors.len(),
        resolved = diff.resolved_errors.len(),
        persistent = diff.persistent_errors.len(),
        "Executions compared"
    );

    diff
}

// =============================================================================
// Roll-up
// =============================================================================

fn build_workflow(
    segment: &WorkflowSegment,
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> WorkflowResult {
    let mut jobs: Vec<JobResult> = segment
        .jobs
        .iter()
        .map(|j| build_job(j, catalog, config))
        .collect();

    if let Some(job) = implicit_job(
        &segment.preamble,
        &segment.preamble_lines,
        segment.exit_failed,
        jobs.is_empty(),
        catalog,
        config,
    ) {
        jobs.insert(0, job);
    }

    WorkflowResult {
        name: segment.name.clone(),
        success: !segment.exit_failed && jobs.iter().all(|j| j.success),
        duration: finite_sum(jobs.iter().map(|j| j.duration)),
        jobs,
    }
}

fn build_job(segment: &JobSegment, catalog: &PatternCatalog, config: &ExtractConfig) -> JobResult {
    let failures = extract_numbered(&segment.body, &segment.body_lines, catalog, config);
    let steps: Vec<StepResult> = segment.steps.iter().map(build_step).collect();

    let explicitly_failed = segment.exit_failed
        || segment.ended == Some(false)
        || steps.iter().any(|s| !s.success);

    JobResult {
        name: segment.name.clone(),
        success: failures.is_empty() && !explicitly_failed,
        duration: finite_sum(steps.iter().map(|s| s.duration)),
        failures,
        steps,
    }
}

fn build_step(segment: &StepSegment) -> StepResult {
    StepResult {
        name: segment.name.clone(),
        success: segment.success.unwrap_or(!segment.exit_failed),
        duration: segment.duration.max(0.0),
        output: (!segment.output.is_empty()).then(|| segment.output.join("\n")),
    }
}

/// Sum of non-negative durations, saturating at `f64::MAX` so results
/// always serialise to JSON numbers.
fn finite_sum(durations: impl Iterator<Item = f64>) -> f64 {
    durations.sum::<f64>().min(f64::MAX)
}

/// Job for lines seen outside any job, or `None` when they do not warrant one.
///
/// Kept when the lines produce failures or a non-zero exit was seen, or when
/// `only_content` is set (nothing else exists to hold them) and any line is
/// non-blank.
fn implicit_job(
    lines: &[String],
    line_numbers: &[usize],
    exit_failed: bool,
    only_content: bool,
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> Option<JobResult> {
    let has_content = lines.iter().any(|l| !l.trim().is_empty());
    if !has_content && !exit_failed {
        return None;
    }

    let failures = extract_numbered(lines, line_numbers, catalog, config);
    if failures.is_empty() && !exit_failed && !only_content {
        return None;
    }

    Some(JobResult {
        name: constants::IMPLICIT_JOB_NAME.to_string(),
        success: failures.is_empty() && !exit_failed,
        failures,
        steps: Vec::new(),
        duration: 0.0,
    })
}

// =============================================================================
// Tests
// =============================================================================
