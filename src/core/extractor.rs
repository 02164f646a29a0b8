// ActLens - core/extractor.rs
//
// Line-oriented failure extraction over raw CI log text.
// Core layer: accepts text already in memory, never touches the filesystem.
//
// Pipeline per line: ANSI strip -> classify (priority-ordered catalog) ->
// message -> location -> context window -> stack trace. After the scan,
// failures are deduplicated by (type, message), keeping first-seen order.
//
// Total over all string input: nothing in here returns an error or panics
// on hostile text. Pattern problems are handled when the catalog is built.

use crate::core::context::{self, truncate_chars};
use crate::core::model::{Failure, FailureType};
use crate::core::patterns::{CustomPatterns, PatternCatalog, PatternMatch};
use crate::core::stacktrace;
use crate::util::constants;
use std::borrow::Cow;
use std::collections::HashSet;

/// Configuration for extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Lines of context captured on each side of a failure line.
    pub context_lines: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            context_lines: constants::DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Extract all failures from `log_text` using `catalog`.
///
/// Empty or whitespace-only input yields an empty list. Each line produces at
/// most one failure; the highest-priority category that matches decides its
/// type. Output contains no two failures with the same `(type, message)`.
pub fn extract_failures(
    log_text: &str,
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> Vec<Failure> {
    if log_text.trim().is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = log_text.lines().collect();
    let numbers: Vec<usize> = (1..=lines.len()).collect();
    extract_numbered(&lines, &numbers, catalog, config)
}

/// Extract failures from lines taken out of a larger log.
///
/// `line_numbers[i]` is the 1-based position of `lines[i]` in that log and
/// is what context lines are labelled with. Missing entries fall back to the
/// position within `lines`.
pub fn extract_numbered<S: AsRef<str>>(
    lines: &[S],
    line_numbers: &[usize],
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> Vec<Failure> {
    if lines.iter().all(|l| l.as_ref().trim().is_empty()) {
        return Vec::new();
    }

    let lines: Vec<Cow<'_, str>> = lines.iter().map(|l| strip_ansi(l.as_ref())).collect();
    let number_of = |idx: usize| line_numbers.get(idx).copied().unwrap_or(idx + 1);

    // Classify first: a stack trace below one failure may not reach into the
    // next failure line.
    let hits: Vec<(usize, PatternMatch)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| catalog.classify(line).map(|hit| (idx, hit)))
        .collect();

    let mut failures = Vec::with_capacity(hits.len());
    for (pos, (idx, hit)) in hits.iter().enumerate() {
        let idx = *idx;
        let line = &lines[idx];
        let next_failure = hits.get(pos + 1).map_or(lines.len(), |(next, _)| *next);

        let message = truncate_chars(&hit.message, constants::MAX_MESSAGE_CHARS).into_owned();

        // The message is usually a suffix of the line; try it first so a
        // location inside the message beats one in a line prefix.
        let (file_path, line_number) = match catalog.locate(&message) {
            (None, None) => catalog.locate(line),
            found => found,
        };

        let (context_before, context_after) =
            context::surrounding_numbered(&lines, idx, config.context_lines, number_of);
        let stack_trace = stacktrace::find_stack_trace_before(&lines, idx, next_failure);

        tracing::trace!(
            line = number_of(idx),
            failure_type = ?hit.failure_type,
            preview = %truncate_chars(line, constants::DEBUG_MAX_LINE_PREVIEW),
            "Failure line matched"
        );

        failures.push(Failure {
            failure_type: hit.failure_type,
            message,
            file_path,
            line_number,
            context_before,
            context_after,
            stack_trace,
        });
    }

    let found = failures.len();
    let failures = dedup_failures(failures);

    tracing::debug!(
        lines = lines.len(),
        matched = found,
        failures = failures.len(),
        "Extraction complete"
    );

    failures
}

/// Convenience entry point: built-in catalog plus optional custom patterns,
/// default context window.
///
/// Invalid custom patterns are skipped (and logged) rather than failing.
pub fn extract_failures_with(log_text: &str, custom: Option<&CustomPatterns>) -> Vec<Failure> {
    let config = ExtractConfig::default();
    match custom {
        Some(custom) if !custom.is_empty() => {
            let catalog = PatternCatalog::builtin().merge(custom);
            extract_failures(log_text, &catalog, &config)
        }
        _ => extract_failures(log_text, PatternCatalog::builtin(), &config),
    }
}

/// Collapse failures with equal `(type, message)`, keeping the first.
pub fn dedup_failures(failures: Vec<Failure>) -> Vec<Failure> {
    let mut seen: HashSet<(FailureType, String)> = HashSet::with_capacity(failures.len());
    failures
        .into_iter()
        .filter(|f| seen.insert((f.failure_type, f.message.clone())))
        .collect()
}

/// Remove ANSI escape sequences (colour codes, cursor movement).
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    if line.contains('\x1b') {
        Cow::Owned(strip_ansi_escapes::strip_str(line))
    } else {
        Cow::Borrowed(line)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str, context_lines: usize) -> Vec<Failure> {
        extract_failures(text, PatternCatalog::builtin(), &ExtractConfig { context_lines })
    }

    #[test]
    fn test_end_to_end_single_error() {
        let log = "Line 1\nLine 2\nError: Something went wrong\nLine 4\nLine 5";
        let failures = extract(log, 2);

        assert_eq!(failures.len(), 1);
        let f = &failures[0];
        assert_eq!(f.failure_type, FailureType::Error);
        assert_eq!(f.message, "Something went wrong");
        assert_eq!(f.context_before, vec!["1: Line 1", "2: Line 2"]);
        assert_eq!(f.context_after, vec!["4: Line 4", "5: Line 5"]);
        assert_eq!(f.file_path, None);
        assert_eq!(f.stack_trace, None);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(extract("", 3).is_empty());
        assert!(extract("   \n\t\n  ", 3).is_empty());
    }

    #[test]
    fn test_priority_assertion_over_error() {
        let failures = extract("AssertionError: x != y", 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].failure_type, FailureType::Assertion);
        assert_eq!(failures[0].message, "x != y");
    }

    #[test]
    fn test_multiple_types_in_one_log() {
        let log = "npm ERR! missing script: build\n\
                   Error: deploy step broke\n\
                   Request timed out\n\
                   2 failing";
        let types: Vec<_> = extract(log, 0).iter().map(|f| f.failure_type).collect();
        assert_eq!(
            types,
            vec![
                FailureType::BuildFailure,
                FailureType::Error,
                FailureType::Timeout,
                FailureType::TestFailure
            ]
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let log = "Error: flaky\nok\nError: flaky\nError: other";
        let failures = extract(log, 1);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].message, "flaky");
        assert_eq!(failures[0].context_after, vec!["2: ok"]);
        assert_eq!(failures[1].message, "other");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let log = "Error: a\nAssertionError: b\nError: a\nsrc/x.py:3: in test";
        assert_eq!(extract(log, 3), extract(log, 3));
    }

    #[test]
    fn test_location_from_message_and_line() {
        let failures = extract("Error: failed to load config.yaml:12", 0);
        assert_eq!(failures[0].file_path.as_deref(), Some("config.yaml"));
        assert_eq!(failures[0].line_number, Some(12));

        let failures = extract("::error file=src/app.py,line=9::Type mismatch", 0);
        assert_eq!(failures[0].message, "Type mismatch");
        assert_eq!(failures[0].file_path.as_deref(), Some("src/app.py"));
        assert_eq!(failures[0].line_number, Some(9));
    }

    #[test]
    fn test_python_traceback_attached() {
        let log = "collecting\n\
                   Traceback (most recent call last):\n\
                   \x20 File \"/w/app.py\", line 4, in <module>\n\
                   \x20   run()\n\
                   RuntimeError: exploded\n\
                   after";
        let failures = extract(log, 1);
        assert_eq!(failures.len(), 1);
        let f = &failures[0];
        assert_eq!(f.message, "exploded");
        let trace = f.stack_trace.as_deref().expect("trace attached");
        assert!(trace.starts_with("Traceback (most recent call last):"));
        assert!(trace.ends_with("RuntimeError: exploded"));
        assert_eq!(f.file_path, None);
    }

    #[test]
    fn test_ansi_codes_are_stripped() {
        let log = "\x1b[31mError: red alert\x1b[0m\nnext";
        let failures = extract(log, 1);
        assert_eq!(failures[0].message, "red alert");
        assert_eq!(failures[0].context_after, vec!["2: next"]);
    }

    #[test]
    fn test_long_message_is_truncated() {
        let log = format!("Error: {}", "é".repeat(constants::MAX_MESSAGE_CHARS * 2));
        let failures = extract(&log, 0);
        assert!(failures[0].message.ends_with(constants::TRUNCATION_SUFFIX));
        assert_eq!(
            failures[0].message.chars().count(),
            constants::MAX_MESSAGE_CHARS + constants::TRUNCATION_SUFFIX.chars().count()
        );
    }

    #[test]
    fn test_garbage_input_never_panics() {
        let garbage: String = (0u32..2048)
            .filter_map(char::from_u32)
            .chain("\u{0}\u{FFFD}\x1b[\x1b]".chars())
            .collect();
        let _ = extract(&garbage, 3);
        let _ = extract(&"\n".repeat(10_000), 3);
        let _ = extract("Error:", 3);
        let _ = extract("\x1b", usize::MAX);
    }

    #[test]
    fn test_custom_patterns_convenience() {
        let mut custom = CustomPatterns::new();
        custom.insert("error".to_string(), vec!["^PANIC: (.+)$".to_string(), "[".to_string()]);
        let failures = extract_failures_with("PANIC: kernel\nfine", Some(&custom));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "kernel");

        assert!(extract_failures_with("PANIC: kernel", None).is_empty());
    }

    #[test]
    fn test_trace_stays_with_the_failure_it_follows() {
        let log = "  1 failing\n\n  1) api\n\
                   \x20    AssertionError: expected 200 to equal 404\n\
                   \x20     at Context.<anonymous> (test/api.test.js:14:10)\n";
        let failures = extract(log, 0);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].failure_type, FailureType::TestFailure);
        assert_eq!(failures[0].stack_trace, None);
        assert_eq!(failures[1].failure_type, FailureType::Assertion);
        assert!(failures[1]
            .stack_trace
            .as_deref()
            .is_some_and(|t| t.contains("test/api.test.js:14:10")));

        let log = "Error: cache restore skipped\n\
                   Traceback (most recent call last):\n\
                   \x20 File \"/w/job.py\", line 3, in <module>\n\
                   \x20   cfg['x']\n\
                   KeyError: 'x'";
        let failures = extract(log, 0);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].message, "cache restore skipped");
        assert_eq!(failures[0].stack_trace, None);
        assert_eq!(failures[1].message, "'x'");
        assert!(failures[1]
            .stack_trace
            .as_deref()
            .is_some_and(|t| t.starts_with("Traceback")));
    }

    #[test]
    fn test_numbered_lines_label_context() {
        let catalog = PatternCatalog::builtin();
        let config = ExtractConfig { context_lines: 1 };
        let lines = ["setup", "Error: late failure", "teardown"];

        let failures = extract_numbered(&lines, &[40, 41, 45], catalog, &config);
        assert_eq!(failures[0].context_before, vec!["40: setup"]);
        assert_eq!(failures[0].context_after, vec!["45: teardown"]);

        let failures = extract_numbered(&lines, &[], catalog, &config);
        assert_eq!(failures[0].context_before, vec!["1: setup"]);

        assert!(extract_numbered(&["", "  "], &[1, 2], catalog, &config).is_empty());
    }
}
