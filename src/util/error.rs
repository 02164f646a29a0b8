// ActLens - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Note: the text-processing core (extraction, analysis, comparison) is total
// over string input and never returns these. They are raised by the layers
// that wrap file access, configuration and export.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ActLens operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ActLensError {
    /// A custom detection pattern was rejected.
    Pattern(PatternError),

    /// A log file could not be read or a saved result could not be loaded.
    Parse(LogParseError),

    /// Batch discovery failed.
    Discovery(DiscoveryError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for ActLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
            Self::Parse(e) => write!(f, "Log parsing error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for ActLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Problems with user-supplied detection patterns.
///
/// These are diagnostics: the offending pattern is skipped and extraction
/// continues with the remaining ones.
#[derive(Debug, Clone)]
pub enum PatternError {
    /// The pattern failed to compile.
    InvalidRegex {
        category: String,
        pattern: String,
        source: regex::Error,
    },

    /// The pattern exceeds the maximum allowed length.
    RegexTooLong {
        category: String,
        length: usize,
        max_length: usize,
    },

    /// The category name is not one of the known failure types.
    UnknownCategory { category: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex {
                category,
                pattern,
                source,
            } => write!(
                f,
                "Category '{category}': invalid regex '{pattern}': {source}"
            ),
            Self::RegexTooLong {
                category,
                length,
                max_length,
            } => write!(
                f,
                "Category '{category}': regex is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::UnknownCategory { category } => write!(
                f,
                "Unknown failure category '{category}'. Expected one of: \
                 assertion, build_failure, test_failure, timeout, error"
            ),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PatternError> for ActLensError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Log parsing errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the I/O layer around the analysis core.
#[derive(Debug)]
pub enum LogParseError {
    /// The log file could not be read.
    Unreadable { path: PathBuf, source: io::Error },

    /// The log file exists but contains nothing to analyse.
    Empty { path: PathBuf },

    /// A saved JSON result could not be deserialised.
    InvalidResult {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for LogParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "'{}': cannot read log: {source}", path.display())
            }
            Self::Empty { path } => write!(f, "'{}': log is empty", path.display()),
            Self::InvalidResult { path, source } => write!(
                f,
                "'{}': not a valid saved analysis result: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            Self::InvalidResult { source, .. } => Some(source),
            Self::Empty { .. } => None,
        }
    }
}

impl From<LogParseError> for ActLensError {
    fn from(e: LogParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to batch log discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<DiscoveryError> for ActLensError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for ActLensError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for ActLensError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ActLens results.
pub type Result<T> = std::result::Result<T, ActLensError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_pattern_error_keeps_regex_source() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = ActLensError::from(PatternError::InvalidRegex {
            category: "error".to_string(),
            pattern: "(unclosed".to_string(),
            source,
        });
        let msg = err.to_string();
        assert!(msg.starts_with("Pattern error: Category 'error'"), "{msg}");
        let inner = err.source().expect("top-level error has a source");
        assert!(inner.source().is_some(), "regex error should be chained");
    }

    #[test]
    fn test_log_parse_error_display() {
        let err = LogParseError::Empty {
            path: PathBuf::from("run.log"),
        };
        assert_eq!(err.to_string(), "'run.log': log is empty");
        assert!(err.source().is_none());
    }
}
