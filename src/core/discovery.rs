// ActLens - core/discovery.rs
//
// Recursive directory traversal for batch analysis.
//
// Uses `walkdir` for traversal and reads only directory entries, never file
// contents; reading belongs to platform::fs.
//
//   - Per-entry I/O errors are non-fatal and collected as warnings.
//   - max_files / max_depth are clamped to named absolute bounds.
//   - Literal exclude patterns (e.g. `node_modules`) prune whole subtrees via
//     filter_entry so they are never descended into.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::path::{Path, PathBuf};

/// Configuration for a discovery walk.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum directory recursion depth.
    pub max_depth: usize,

    /// Maximum number of log files returned.
    pub max_files: usize,

    /// Filename globs a file must match. Empty means "everything not excluded".
    pub include_patterns: Vec<String>,

    /// Globs matched against filenames, and (when literal) directory names.
    pub exclude_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: to_strings(constants::DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: to_strings(constants::DEFAULT_EXCLUDE_PATTERNS),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Find log files under `root`.
///
/// Returns the matching paths sorted lexicographically, plus human-readable
/// warnings for entries that could not be visited and for truncation at
/// `max_files`. Fails only when `root` itself is unusable.
pub fn discover_logs(
    root: &Path,
    config: &DiscoveryConfig,
) -> Result<(Vec<PathBuf>, Vec<String>), DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let max_files = config.max_files.min(constants::ABSOLUTE_MAX_FILES);
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?config.include_patterns,
        exclude = ?config.exclude_patterns,
        "Discovery starting"
    );

    let include_pats = compile_patterns(&config.include_patterns, "include");
    let exclude_pats = compile_patterns(&config.exclude_patterns, "exclude");

    let mut files: Vec<PathBuf> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_str().unwrap_or("");
            !is_excluded_component(name, &exclude_pats)
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let msg = format!("Cannot access '{path_str}': {e}");
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warnings.push(format!("Skipping '{}': non-UTF-8 filename", path.display()));
            continue;
        };

        if is_excluded_filename(file_name, &exclude_pats) {
            tracing::trace!(file = file_name, "Excluded by pattern");
            continue;
        }
        if !is_included(file_name, &include_pats) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    let total_found = files.len();

    if total_found > max_files {
        files.truncate(max_files);
        warnings.push(format!(
            "{total_found} log files were found but the limit is {max_files}. \
             Only the first {max_files} (by path) will be analysed. \
             Raise [discovery] max_files in config.toml if you need more."
        ));
        tracing::info!(total_found, limit = max_files, "Discovered file list truncated");
    }

    tracing::debug!(
        total_found,
        files = files.len(),
        warnings = warnings.len(),
        "Discovery complete"
    );

    Ok((files, warnings))
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob strings, logging and skipping any that fail.
fn compile_patterns(patterns: &[String], kind: &str) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, kind, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// Literal (wildcard-free) exclude patterns double as directory-name matchers.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains(['*', '?', '[']) && p.matches(dir_name)
    })
}

fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    include_pats.is_empty() || include_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================
