// ActLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers. Every record is
// fully materialised and JSON-serialisable so formatters and the comparison
// routine can consume them without driving any lazy state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Failure type
// =============================================================================

/// Failure categories, declared in detection priority order (most specific
/// first). When several categories match the same line, the earliest wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    Assertion,
    BuildFailure,
    TestFailure,
    Timeout,
    Error,
}

impl FailureType {
    /// Returns all variants in detection priority order.
    pub fn all() -> &'static [FailureType] {
        &[
            FailureType::Assertion,
            FailureType::BuildFailure,
            FailureType::TestFailure,
            FailureType::Timeout,
            FailureType::Error,
        ]
    }

    /// Category name as used in configuration (`[patterns]` keys).
    pub fn name(&self) -> &'static str {
        match self {
            FailureType::Assertion => "assertion",
            FailureType::BuildFailure => "build_failure",
            FailureType::TestFailure => "test_failure",
            FailureType::Timeout => "timeout",
            FailureType::Error => "error",
        }
    }

    /// Parse a configuration category name. Case-insensitive; `-` and `_`
    /// are interchangeable.
    pub fn from_name(name: &str) -> Option<FailureType> {
        let normalised = name.trim().to_ascii_lowercase().replace('-', "_");
        FailureType::all()
            .iter()
            .copied()
            .find(|t| t.name() == normalised)
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            FailureType::Assertion => "Assertion",
            FailureType::BuildFailure => "Build failure",
            FailureType::TestFailure => "Test failure",
            FailureType::Timeout => "Timeout",
            FailureType::Error => "Error",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Failure
// =============================================================================

/// One detected problem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(rename = "type")]
    pub failure_type: FailureType,

    /// Human-readable description. Never empty.
    pub message: String,

    /// Source file named by the failure, when one could be located.
    pub file_path: Option<String>,

    /// 1-based line within `file_path`. Usually paired with `file_path`.
    pub line_number: Option<u32>,

    /// Rendered lines preceding the failure line (`"N: text"`, where N is
    /// the line number in the analysed log, not within the job).
    #[serde(default)]
    pub context_before: Vec<String>,

    /// Rendered lines following the failure line (`"N: text"`).
    #[serde(default)]
    pub context_after: Vec<String>,

    /// Associated multi-line stack trace, verbatim.
    pub stack_trace: Option<String>,
}

impl Failure {
    /// A failure with only type and message set.
    pub fn new(failure_type: FailureType, message: impl Into<String>) -> Self {
        Self {
            failure_type,
            message: message.into(),
            file_path: None,
            line_number: None,
            context_before: Vec::new(),
            context_after: Vec::new(),
            stack_trace: None,
        }
    }

    /// Identity used for deduplication and run-to-run comparison.
    pub fn key(&self) -> (FailureType, &str) {
        (self.failure_type, self.message.as_str())
    }

    /// `file:line` (or just `file`) when a location was extracted.
    pub fn location(&self) -> Option<String> {
        match (&self.file_path, self.line_number) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            (Some(file), None) => Some(file.clone()),
            _ => None,
        }
    }
}

// =============================================================================
// Execution tree
// =============================================================================

/// Outcome of one step inside a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    /// Seconds, never negative.
    pub duration: f64,
    /// Raw captured output of the step, if any was seen.
    pub output: Option<String>,
}

/// Outcome of one job.
///
/// `success` normally equals `failures.is_empty()`, but both fields are set
/// independently; the analyzer also fails a job on explicit exit markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub name: String,
    pub success: bool,
    #[serde(default)]
    pub failures: Vec<Failure>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    pub duration: f64,
}

/// Outcome of one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub name: String,
    pub success: bool,
    #[serde(default)]
    pub jobs: Vec<JobResult>,
    pub duration: f64,
}

/// Full structured output of analysing one CI run's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub workflows: Vec<WorkflowResult>,
    pub total_duration: f64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Where the raw log was persisted, when the caller saved it.
    pub log_path: Option<String>,
}

impl ExecutionResult {
    /// An execution stamped with the current time.
    pub fn new(success: bool, workflows: Vec<WorkflowResult>, total_duration: f64) -> Self {
        Self {
            success,
            workflows,
            total_duration,
            timestamp: Utc::now(),
            log_path: None,
        }
    }

    /// Number of failures across every job of every workflow.
    pub fn total_failures(&self) -> usize {
        self.workflows
            .iter()
            .flat_map(|w| &w.jobs)
            .map(|j| j.failures.len())
            .sum()
    }

    /// Workflows whose `success` flag is false.
    pub fn failed_workflows(&self) -> Vec<&WorkflowResult> {
        self.workflows.iter().filter(|w| !w.success).collect()
    }

    /// All failures flattened in workflow -> job -> detection order.
    pub fn all_failures(&self) -> impl Iterator<Item = &Failure> {
        self.workflows
            .iter()
            .flat_map(|w| &w.jobs)
            .flat_map(|j| &j.failures)
    }
}

// =============================================================================
// Comparison
// =============================================================================

/// Difference between two executions, keyed by `(type, message)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDiff {
    /// In the current run but not the baseline (current order).
    pub new_errors: Vec<Failure>,
    /// In the baseline but not the current run (baseline order).
    pub resolved_errors: Vec<Failure>,
    /// In both runs (current order, current record).
    pub persistent_errors: Vec<Failure>,
}

impl ExecutionDiff {
    /// True when nothing new appeared and nothing was fixed.
    pub fn is_unchanged(&self) -> bool {
        self.new_errors.is_empty() && self.resolved_errors.is_empty()
    }
}
