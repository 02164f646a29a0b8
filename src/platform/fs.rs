// ActLens - platform/fs.rs
//
// Filesystem access for the analysis core: log reading and saved-result
// loading. Everything above this layer works on in-memory text.

use crate::core::model::ExecutionResult;
use crate::util::error::{ExportError, LogParseError};
use std::path::Path;

/// Read a whole log file.
///
/// Invalid UTF-8 is replaced rather than rejected; CI logs routinely contain
/// truncated multi-byte sequences. A file with no non-whitespace content is
/// an `Empty` error.
pub fn read_log(path: &Path) -> Result<String, LogParseError> {
    let bytes = std::fs::read(path).map_err(|e| LogParseError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    if text.trim().is_empty() {
        return Err(LogParseError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Log read");
    Ok(text)
}

/// Load an `ExecutionResult` previously saved as JSON.
pub fn load_result(path: &Path) -> Result<ExecutionResult, LogParseError> {
    let bytes = std::fs::read(path).map_err(|e| LogParseError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| LogParseError::InvalidResult {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create (or truncate) an export target.
pub fn create_export_file(path: &Path) -> Result<std::io::BufWriter<std::fs::File>, ExportError> {
    std::fs::File::create(path)
        .map(std::io::BufWriter::new)
        .map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}
