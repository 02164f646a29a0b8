// ActLens - app/batch.rs
//
// Parallel analysis of many log files.
//
// The catalog is compiled once by the caller and shared read-only across
// rayon workers. Each file is read, analysed and reported independently: one
// unreadable file never aborts the batch. Output order matches input order.

use crate::core::analyzer;
use crate::core::extractor::ExtractConfig;
use crate::core::model::ExecutionResult;
use crate::core::patterns::PatternCatalog;
use crate::platform::fs;
use crate::util::error::LogParseError;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of analysing one file in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: Result<ExecutionResult, LogParseError>,
}

impl BatchOutcome {
    /// True when the file was analysed and its execution succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(r) if r.success)
    }

    /// Serialisable view for JSON output.
    pub fn report(&self) -> BatchReportEntry<'_> {
        match &self.result {
            Ok(result) => BatchReportEntry {
                path: self.path.display().to_string(),
                result: Some(result),
                error: None,
            },
            Err(e) => BatchReportEntry {
                path: self.path.display().to_string(),
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// One file of a batch as written to JSON.
#[derive(Debug, Serialize)]
pub struct BatchReportEntry<'a> {
    pub path: String,
    pub result: Option<&'a ExecutionResult>,
    pub error: Option<String>,
}

/// Analyse every file in `paths` in parallel.
pub fn analyze_files(
    paths: &[PathBuf],
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> Vec<BatchOutcome> {
    tracing::debug!(files = paths.len(), threads = rayon::current_num_threads(), "Batch starting");

    let outcomes: Vec<BatchOutcome> = paths
        .par_iter()
        .map(|path| BatchOutcome {
            path: path.clone(),
            result: analyze_file(path, catalog, config),
        })
        .collect();

    let failed_reads = outcomes.iter().filter(|o| o.result.is_err()).count();
    let failed_runs = outcomes
        .iter()
        .filter(|o| matches!(&o.result, Ok(r) if !r.success))
        .count();
    tracing::debug!(
        files = outcomes.len(),
        failed_reads,
        failed_runs,
        "Batch complete"
    );

    outcomes
}

/// Read and analyse one log file, recording its path on the result.
pub fn analyze_file(
    path: &Path,
    catalog: &PatternCatalog,
    config: &ExtractConfig,
) -> Result<ExecutionResult, LogParseError> {
    let text = fs::read_log(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Skipping log");
        e
    })?;
    let mut result = analyzer::analyze_log(&text, catalog, config);
    result.log_path = Some(path.display().to_string());
    Ok(result)
}
