// ActLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ActLens";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ActLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Extraction
// =============================================================================

/// Default number of lines captured before and after a failure line.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Hard upper bound on the configurable context window.
pub const MAX_CONTEXT_LINES: usize = 50;

/// Maximum length (in chars) of a failure message. Longer messages are
/// truncated so a single minified line cannot balloon the result tree.
pub const MAX_MESSAGE_CHARS: usize = 1_024;

/// Maximum length (in chars) of a single rendered context line.
pub const MAX_CONTEXT_LINE_CHARS: usize = 500;

/// Suffix appended to truncated text.
pub const TRUNCATION_SUFFIX: &str = "... [truncated]";

/// Maximum regex pattern length for user-supplied patterns.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Stack-trace association
// =============================================================================

/// How far above a failure line to look for a Python traceback header.
/// Tracebacks end at the exception line, which is usually the failure
/// line itself, so the header sits above it.
pub const STACK_TRACE_LOOKBEHIND: usize = 100;

/// How far below a failure line a stack trace may start.
pub const STACK_TRACE_LOOKAHEAD: usize = 10;

/// Maximum number of lines captured into a single stack trace block.
pub const MAX_STACK_TRACE_LINES: usize = 200;

// =============================================================================
// Segmentation
// =============================================================================

/// Name given to the workflow that holds lines seen before any banner.
pub const IMPLICIT_WORKFLOW_NAME: &str = "(unnamed workflow)";

/// Name given to the job that holds lines seen outside any job banner.
pub const IMPLICIT_JOB_NAME: &str = "(unnamed job)";

// =============================================================================
// Discovery limits
// =============================================================================

/// Maximum directory recursion depth during batch discovery.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Maximum number of log files analysed in a single batch.
pub const DEFAULT_MAX_FILES: usize = 500;

/// Lower bound on configurable max files.
pub const MIN_MAX_FILES: usize = 1;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 10_000;

/// Hard upper bound on max depth (prevents infinite traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Default include glob patterns for log file discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log", "*.txt"];

/// Default exclude glob patterns for log file discovery.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.gz", "*.zip", "node_modules", ".git"];

// =============================================================================
// Logging
// =============================================================================

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
