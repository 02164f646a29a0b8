// ActLens - core/patterns.rs
//
// Failure pattern catalog: category -> ordered compiled regexes, plus the
// file/line location patterns.
// Core layer: accepts pattern strings, never touches the filesystem.
//
// The built-in catalog is compiled once and never mutated. Custom patterns
// are merged into a new owned catalog, so a catalog can be shared across
// threads and injected into tests without any global registry.

use crate::core::model::FailureType;
use crate::util::constants;
use crate::util::error::PatternError;
use regex::{Captures, Regex, RegexSet};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// User-supplied detection patterns: category name -> regex sources.
/// Category names follow `FailureType::name` (`"error"`, `"timeout"`, ...).
pub type CustomPatterns = BTreeMap<String, Vec<String>>;

// =============================================================================
// Built-in pattern tables
// =============================================================================
//
// Message capture: the named group `message`, else group 1, else the whole
// trimmed line. Groups that are not the message are written `(?:...)`.

const ASSERTION_PATTERNS: &[&str] = &[
    r"AssertionError:?\s*(.*)$",
    r"(?i)\bassert(?:ion)?\b.*\bfailed\b",
    r"^\s*Expected:\s*\S",
    r"^\s*Actual:\s*\S",
    r"[✕✗]\s+(.+?)(?:\s+\(\d+\s*ms\))?\s*$",
    r"^\s*FAIL\s+(\S+)",
    r"^E\s+(assert\s.+)$",
];

const BUILD_FAILURE_PATTERNS: &[&str] = &[
    r"(?i)\bbuild failed\b[:.!]?\s*(.*)$",
    r"(?i)\bcompilation failed\b[:.!]?\s*(.*)$",
    r"^\s*npm ERR!\s*(.+)$",
    r"\b(ERR_PNPM_\w+.*)$",
    r"^\s*(ERROR: (?:Could not find a version|No matching distribution|Could not install packages).*)$",
    r"^\s*error\[E\d{4}\]:\s*(.+)$",
    r"\berror TS\d+:\s*(.+)$",
    r"\bSyntaxError:\s*(.+)$",
    r"\b(?:ImportError|ModuleNotFoundError):\s*(.+)$",
];

const TEST_FAILURE_PATTERNS: &[&str] = &[
    r"^\s*\d+\s+failing\b",
    r"\b\d+\s+failed,\s*\d+\s+passed\b",
    r"^\s*FAILED\s+(\S.*)$",
    r"^\s*test result: FAILED\b",
    r"(?i)\bcoverage\b.*\b(?:threshold|minimum)\b.*\b(?:not (?:met|reached)|failed?)\b",
    r"(?i)\brequired test coverage of \S+ not reached",
];

const TIMEOUT_PATTERNS: &[&str] = &[
    r"(?i)killed due to timeout",
    r"(?i)\btimed out\b",
    r"(?i)\btimeout\b",
];

const ERROR_PATTERNS: &[&str] = &[
    r"##\[error\]\s*(.+)$",
    r"::error(?:\s[^:]*)?::\s*(.+)$",
    r"Process completed with exit code [1-9]\d*",
    r"\[ERROR\]\s*(.+)$",
    r"\bERROR:\s*(.*)$",
    r"thread '[^']*' panicked at .+",
    r"\bError:\s*(.*)$",
    r"^\s*[A-Za-z_][\w.]*(?:Error|Exception):\s*(.+)$",
    r"^\s*error:\s*(.+)$",
    r"\S+: command not found",
];

/// File/line location patterns, tried in order; first match wins.
/// Each has `file` and `line` named groups.
const LOCATION_PATTERNS: &[&str] = &[
    r"file=(?P<file>[^,\s:]+),\s*line=(?P<line>\d+)",
    r#"File "(?P<file>[^"]+)", line (?P<line>\d+)"#,
    r"(?P<file>[\w./\\-]+\.[A-Za-z]\w*)\((?P<line>\d+),\d+\)",
    r"(?P<file>[\w./\\-]+\.[A-Za-z]\w*):(?P<line>\d+):\d+",
    r"(?P<file>[\w./\\-]+\.[A-Za-z]\w*):(?P<line>\d+): in \S+",
    r"(?P<file>[\w./\\-]+\.[A-Za-z]\w*):(?P<line>\d+)",
];

fn builtin_sources(failure_type: FailureType) -> &'static [&'static str] {
    match failure_type {
        FailureType::Assertion => ASSERTION_PATTERNS,
        FailureType::BuildFailure => BUILD_FAILURE_PATTERNS,
        FailureType::TestFailure => TEST_FAILURE_PATTERNS,
        FailureType::Timeout => TIMEOUT_PATTERNS,
        FailureType::Error => ERROR_PATTERNS,
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A successful classification of one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub failure_type: FailureType,
    /// Extracted message, trimmed and non-empty.
    pub message: String,
}

/// Immutable table of compiled failure patterns.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    /// One entry per category, in `FailureType::all()` priority order.
    categories: Vec<(FailureType, Vec<Regex>)>,

    /// File/line extraction patterns.
    location: Vec<Regex>,

    /// All detection patterns in priority order, for single-pass rejection
    /// of lines that match nothing. `None` if the set could not be built.
    prefilter: Option<RegexSet>,

    /// Problems found while compiling custom patterns.
    diagnostics: Vec<PatternError>,
}

impl PatternCatalog {
    /// The shared built-in catalog, compiled on first use.
    pub fn builtin() -> &'static PatternCatalog {
        static BUILTIN: OnceLock<PatternCatalog> = OnceLock::new();
        BUILTIN.get_or_init(PatternCatalog::compile_builtin)
    }

    fn compile_builtin() -> PatternCatalog {
        let mut diagnostics = Vec::new();
        let mut compile_all = |category: &str, sources: &[&str]| -> Vec<Regex> {
            sources
                .iter()
                .filter_map(|src| match compile_pattern(category, src) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        // Built-in failures are bugs, but we still degrade gracefully
                        tracing::error!(error = %e, "Failed to compile built-in pattern");
                        diagnostics.push(e);
                        None
                    }
                })
                .collect()
        };

        let categories: Vec<(FailureType, Vec<Regex>)> = FailureType::all()
            .iter()
            .map(|t| (*t, compile_all(t.name(), builtin_sources(*t))))
            .collect();
        let location = compile_all("location", LOCATION_PATTERNS);

        let mut catalog = PatternCatalog {
            categories,
            location,
            prefilter: None,
            diagnostics,
        };
        catalog.rebuild_prefilter();

        tracing::debug!(
            patterns = catalog.pattern_count(),
            "Built-in pattern catalog compiled"
        );
        catalog
    }

    /// Return a new catalog with `custom` appended after the built-ins of
    /// each category. Built-ins therefore win when both match the same line.
    ///
    /// Invalid patterns and unknown categories are skipped, logged, and
    /// recorded in `diagnostics()` of the returned catalog.
    pub fn merge(&self, custom: &CustomPatterns) -> PatternCatalog {
        let mut merged = self.clone();
        if custom.is_empty() {
            return merged;
        }

        for (category, sources) in custom {
            let Some(failure_type) = FailureType::from_name(category) else {
                let err = PatternError::UnknownCategory {
                    category: category.clone(),
                };
                tracing::warn!(error = %err, "Skipping custom patterns");
                merged.diagnostics.push(err);
                continue;
            };

            for source in sources {
                match compile_pattern(failure_type.name(), source) {
                    Ok(re) => merged.category_mut(failure_type).push(re),
                    Err(err) => {
                        tracing::warn!(error = %err, "Skipping custom pattern");
                        merged.diagnostics.push(err);
                    }
                }
            }
        }

        merged.rebuild_prefilter();
        merged
    }

    /// Ordered detection patterns for one category.
    pub fn patterns_for(&self, failure_type: FailureType) -> &[Regex] {
        self.categories
            .iter()
            .find(|(t, _)| *t == failure_type)
            .map(|(_, pats)| pats.as_slice())
            .unwrap_or(&[])
    }

    /// Ordered file/line extraction patterns.
    pub fn location_patterns(&self) -> &[Regex] {
        &self.location
    }

    /// Diagnostics collected while building this catalog.
    pub fn diagnostics(&self) -> &[PatternError] {
        &self.diagnostics
    }

    /// Total number of detection patterns across all categories.
    pub fn pattern_count(&self) -> usize {
        self.categories.iter().map(|(_, p)| p.len()).sum()
    }

    /// Classify a single line.
    ///
    /// Categories are tried in priority order and patterns within a category
    /// in list order; the first matching pattern decides the type and
    /// supplies the message. Returns `None` for blank lines and lines that
    /// match nothing.
    pub fn classify(&self, line: &str) -> Option<PatternMatch> {
        if line.trim().is_empty() {
            return None;
        }

        match &self.prefilter {
            Some(set) => {
                // Set indices follow priority order, so the lowest hit wins.
                let first = set.matches(line).iter().next()?;
                let (failure_type, re) = self.flat_patterns().nth(first)?;
                let caps = re.captures(line)?;
                Some(PatternMatch {
                    failure_type,
                    message: capture_message(&caps, line),
                })
            }
            None => self.flat_patterns().find_map(|(failure_type, re)| {
                re.captures(line).map(|caps| PatternMatch {
                    failure_type,
                    message: capture_message(&caps, line),
                })
            }),
        }
    }

    /// Extract `(file_path, line_number)` from text.
    ///
    /// The first location pattern that matches wins. A line number that is
    /// zero or does not fit in `u32` is dropped while the file is kept.
    pub fn locate(&self, text: &str) -> (Option<String>, Option<u32>) {
        for re in &self.location {
            if let Some(caps) = re.captures(text) {
                let file = caps.name("file").map(|m| m.as_str().to_string());
                let line = caps
                    .name("line")
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .filter(|n| *n > 0);
                if file.is_some() {
                    return (file, line);
                }
            }
        }
        (None, None)
    }

    fn category_mut(&mut self, failure_type: FailureType) -> &mut Vec<Regex> {
        if let Some(pos) = self.categories.iter().position(|(t, _)| *t == failure_type) {
            &mut self.categories[pos].1
        } else {
            self.categories.push((failure_type, Vec::new()));
            self.categories.sort_by_key(|(t, _)| *t);
            let pos = self
                .categories
                .iter()
                .position(|(t, _)| *t == failure_type)
                .unwrap_or(0);
            &mut self.categories[pos].1
        }
    }

    fn flat_patterns(&self) -> impl Iterator<Item = (FailureType, &Regex)> {
        self.categories
            .iter()
            .flat_map(|(t, pats)| pats.iter().map(move |re| (*t, re)))
    }

    fn rebuild_prefilter(&mut self) {
        let sources: Vec<&str> = self.flat_patterns().map(|(_, re)| re.as_str()).collect();
        self.prefilter = match RegexSet::new(&sources) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(error = %e, "Pattern prefilter unavailable; matching sequentially");
                None
            }
        };
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        PatternCatalog::builtin().clone()
    }
}

/// Compile a pattern with length validation.
fn compile_pattern(category: &str, pattern: &str) -> Result<Regex, PatternError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(PatternError::RegexTooLong {
            category: category.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
        category: category.to_string(),
        pattern: pattern.to_string(),
        source: e,
    })
}

fn capture_message(caps: &Captures<'_>, line: &str) -> String {
    caps.name("message")
        .or_else(|| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| line.trim())
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Option<(FailureType, String)> {
        PatternCatalog::builtin()
            .classify(line)
            .map(|m| (m.failure_type, m.message))
    }

    #[test]
    fn test_builtin_patterns_all_compile() {
        let catalog = PatternCatalog::builtin();
        assert!(
            catalog.diagnostics().is_empty(),
            "built-in patterns failed: {:?}",
            catalog.diagnostics()
        );
        for t in FailureType::all() {
            assert_eq!(
                catalog.patterns_for(*t).len(),
                builtin_sources(*t).len(),
                "category {t:?}"
            );
        }
        assert_eq!(catalog.location_patterns().len(), LOCATION_PATTERNS.len());
    }

    #[test]
    fn test_error_patterns() {
        assert_eq!(
            classify("Error: Something went wrong"),
            Some((FailureType::Error, "Something went wrong".to_string()))
        );
        assert_eq!(
            classify("##[error]Process completed with exit code 1."),
            Some((
                FailureType::Error,
                "Process completed with exit code 1.".to_string()
            ))
        );
        assert_eq!(
            classify("[ERROR] Failed to execute goal"),
            Some((FailureType::Error, "Failed to execute goal".to_string()))
        );
        assert_eq!(
            classify("/bin/sh: 1: pnpm: command not found"),
            Some((
                FailureType::Error,
                "/bin/sh: 1: pnpm: command not found".to_string()
            ))
        );
        assert_eq!(
            classify("ValueError: invalid literal"),
            Some((FailureType::Error, "invalid literal".to_string()))
        );
        assert!(classify("Process completed with exit code 0.").is_none());
    }

    #[test]
    fn test_assertion_patterns() {
        assert_eq!(
            classify("E   assert 1 == 2"),
            Some((FailureType::Assertion, "assert 1 == 2".to_string()))
        );
        assert_eq!(
            classify("  ✕ adds two numbers (3 ms)"),
            Some((FailureType::Assertion, "adds two numbers".to_string()))
        );
        assert_eq!(
            classify("FAIL src/math.test.js"),
            Some((FailureType::Assertion, "src/math.test.js".to_string()))
        );
        assert_eq!(
            classify("    Expected: 5").map(|(t, _)| t),
            Some(FailureType::Assertion)
        );
        assert_eq!(
            classify("    Actual: 4"),
            Some((FailureType::Assertion, "Actual: 4".to_string()))
        );
        assert!(classify("Actual:").is_none());
    }

    #[test]
    fn test_bare_error_prefix_falls_back_to_line() {
        assert_eq!(classify("Error:"), Some((FailureType::Error, "Error:".to_string())));
        assert_eq!(classify("  ERROR:  "), Some((FailureType::Error, "ERROR:".to_string())));
    }

    #[test]
    fn test_build_test_and_timeout_patterns() {
        assert_eq!(
            classify("npm ERR! code ELIFECYCLE"),
            Some((FailureType::BuildFailure, "code ELIFECYCLE".to_string()))
        );
        assert_eq!(
            classify("ModuleNotFoundError: No module named 'requests'"),
            Some((
                FailureType::BuildFailure,
                "No module named 'requests'".to_string()
            ))
        );
        assert_eq!(
            classify("Build failed"),
            Some((FailureType::BuildFailure, "Build failed".to_string()))
        );
        assert_eq!(
            classify("  3 failing"),
            Some((FailureType::TestFailure, "3 failing".to_string()))
        );
        assert_eq!(
            classify("FAILED tests/test_api.py::test_login - KeyError"),
            Some((
                FailureType::TestFailure,
                "tests/test_api.py::test_login - KeyError".to_string()
            ))
        );
        assert_eq!(
            classify("Jest: \"global\" coverage threshold for lines (80%) not met: 72%")
                .map(|(t, _)| t),
            Some(FailureType::TestFailure)
        );
        assert_eq!(
            classify("The job running on runner X has exceeded the maximum execution time, killed due to timeout")
                .map(|(t, _)| t),
            Some(FailureType::Timeout)
        );
        assert_eq!(
            classify("Request timed out after 30s").map(|(t, _)| t),
            Some(FailureType::Timeout)
        );
    }

    #[test]
    fn test_assertion_wins_over_error() {
        assert_eq!(
            classify("AssertionError: x != y"),
            Some((FailureType::Assertion, "x != y".to_string()))
        );
    }

    #[test]
    fn test_no_match_for_plain_lines() {
        assert!(classify("Line 1").is_none());
        assert!(classify("").is_none());
        assert!(classify("   ").is_none());
        assert!(classify("Running 12 tests in parallel").is_none());
    }

    #[test]
    fn test_locate() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(
            catalog.locate("Error in file.py:42"),
            (Some("file.py".to_string()), Some(42))
        );
        assert_eq!(
            catalog.locate("src/index.ts:10:5 - error"),
            (Some("src/index.ts".to_string()), Some(10))
        );
        assert_eq!(
            catalog.locate("::error file=app/main.py,line=7::bad"),
            (Some("app/main.py".to_string()), Some(7))
        );
        assert_eq!(
            catalog.locate("tests/test_x.py:12: in test_thing"),
            (Some("tests/test_x.py".to_string()), Some(12))
        );
        assert_eq!(
            catalog.locate(r#"  File "/app/run.py", line 3, in <module>"#),
            (Some("/app/run.py".to_string()), Some(3))
        );
        assert_eq!(
            catalog.locate("src/server.ts(3,8): error TS2307: Cannot find module"),
            (Some("src/server.ts".to_string()), Some(3))
        );
        assert_eq!(catalog.locate("no file info here"), (None, None));
    }

    #[test]
    fn test_locate_drops_zero_and_overflowing_line() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(
            catalog.locate("main.rs:0"),
            (Some("main.rs".to_string()), None)
        );
        assert_eq!(
            catalog.locate("main.rs:99999999999999"),
            (Some("main.rs".to_string()), None)
        );
    }

    #[test]
    fn test_merge_appends_custom_patterns() {
        let mut custom = CustomPatterns::new();
        custom.insert("timeout".to_string(), vec![r"deadline exceeded".to_string()]);
        custom.insert("Error".to_string(), vec![r"^FATAL (.+)$".to_string()]);

        let base = PatternCatalog::builtin();
        let merged = base.merge(&custom);

        assert!(merged.diagnostics().is_empty());
        assert_eq!(merged.pattern_count(), base.pattern_count() + 2);
        assert_eq!(
            merged.classify("context deadline exceeded").map(|m| m.failure_type),
            Some(FailureType::Timeout)
        );
        assert_eq!(
            merged.classify("FATAL disk full").map(|m| m.message),
            Some("disk full".to_string())
        );
        // The built-in catalog is untouched.
        assert!(base.classify("FATAL disk full").is_none());
    }

    #[test]
    fn test_builtin_wins_over_custom_in_same_category() {
        let mut custom = CustomPatterns::new();
        custom.insert("error".to_string(), vec![r"Error: (Some)".to_string()]);
        let merged = PatternCatalog::builtin().merge(&custom);
        assert_eq!(
            merged.classify("Error: Something broke").map(|m| m.message),
            Some("Something broke".to_string())
        );
    }

    #[test]
    fn test_merge_skips_invalid_patterns() {
        let mut custom = CustomPatterns::new();
        custom.insert(
            "error".to_string(),
            vec!["(unclosed".to_string(), r"^OOPS$".to_string()],
        );
        custom.insert("warning".to_string(), vec!["x".to_string()]);
        custom.insert(
            "timeout".to_string(),
            vec!["a".repeat(constants::MAX_REGEX_PATTERN_LENGTH + 1)],
        );

        let merged = PatternCatalog::builtin().merge(&custom);

        assert_eq!(merged.diagnostics().len(), 3);
        assert!(merged
            .diagnostics()
            .iter()
            .any(|d| matches!(d, PatternError::InvalidRegex { .. })));
        assert!(merged
            .diagnostics()
            .iter()
            .any(|d| matches!(d, PatternError::UnknownCategory { .. })));
        assert!(merged
            .diagnostics()
            .iter()
            .any(|d| matches!(d, PatternError::RegexTooLong { .. })));
        // The valid sibling pattern still works.
        assert_eq!(
            merged.classify("OOPS").map(|m| m.failure_type),
            Some(FailureType::Error)
        );
    }

    #[test]
    fn test_sequential_fallback_matches_prefilter() {
        let mut catalog = PatternCatalog::builtin().clone();
        catalog.prefilter = None;
        for line in [
            "AssertionError: x != y",
            "Error: Something went wrong",
            "  2 failing",
            "nothing here",
        ] {
            assert_eq!(
                catalog.classify(line),
                PatternCatalog::builtin().classify(line),
                "line: {line}"
            );
        }
    }
}
