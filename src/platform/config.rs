// ActLens - platform/config.rs
//
// Config directory resolution and config.toml loading with validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. Loading never fails: problems become
// human-readable warnings and the affected value falls back to its default.

use crate::core::discovery::DiscoveryConfig;
use crate::core::extractor::ExtractConfig;
use crate::core::patterns::CustomPatterns;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ActLens configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/actlens/ or %APPDATA%\ActLens\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => Self {
                config_dir: proj_dirs.config_dir().to_path_buf(),
            },
            None => Self {
                config_dir: PathBuf::from("."),
            },
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// Raw shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub extraction: ExtractionSection,
    /// `[patterns]`: category name -> extra regexes.
    pub patterns: CustomPatterns,
    pub discovery: DiscoverySection,
    pub logging: LoggingSection,
}

/// `[extraction]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    pub context_lines: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub max_depth: Option<usize>,
    pub max_files: Option<usize>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// "error", "warn", "info", "debug" or "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr).
    pub file: Option<String>,
}

// =============================================================================
// Validated config
// =============================================================================

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Extraction --
    pub context_lines: usize,
    pub custom_patterns: CustomPatterns,

    // -- Discovery --
    pub max_depth: usize,
    pub max_files: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    // -- Logging --
    /// Level string, applied when neither RUST_LOG nor --debug is set.
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let discovery = DiscoveryConfig::default();
        Self {
            context_lines: constants::DEFAULT_CONTEXT_LINES,
            custom_patterns: CustomPatterns::new(),
            max_depth: discovery.max_depth,
            max_files: discovery.max_files,
            include_patterns: discovery.include_patterns,
            exclude_patterns: discovery.exclude_patterns,
            log_level: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            context_lines: self.context_lines,
        }
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            max_depth: self.max_depth,
            max_files: self.max_files,
            include_patterns: self.include_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
        }
    }

    /// Apply a `--context-lines` override, clamped like the file value.
    /// Returns a warning when the value had to be clamped.
    pub fn override_context_lines(&mut self, lines: usize) -> Option<String> {
        if lines > constants::MAX_CONTEXT_LINES {
            self.context_lines = constants::MAX_CONTEXT_LINES;
            return Some(format!(
                "--context-lines {lines} exceeds the maximum of {max}; using {max}.",
                max = constants::MAX_CONTEXT_LINES
            ));
        }
        self.context_lines = lines;
        None
    }
}

/// Read and parse a config file without validating it.
pub fn read_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load and validate a config file.
///
/// A missing file yields defaults with no warnings (first run). An unreadable
/// or unparseable file yields defaults with one warning.
pub fn load_config_from(path: &Path) -> (AppConfig, Vec<String>) {
    if !path.exists() {
        return (AppConfig::default(), Vec::new());
    }

    match read_config_file(path) {
        Ok(raw) => validate(raw),
        Err(e) => (AppConfig::default(), vec![format!("{e}. Using defaults.")]),
    }
}

/// Load config.toml from the platform config directory.
pub fn load_config(paths: &PlatformPaths) -> (AppConfig, Vec<String>) {
    load_config_from(&paths.config_file())
}

/// Validate each field against named constants, accumulating all warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Extraction: context_lines --
    if let Some(lines) = raw.extraction.context_lines {
        if lines <= constants::MAX_CONTEXT_LINES {
            config.context_lines = lines;
        } else {
            warnings.push(format!(
                "[extraction] context_lines = {lines} is out of range (0-{}). Using default ({}).",
                constants::MAX_CONTEXT_LINES,
                constants::DEFAULT_CONTEXT_LINES,
            ));
        }
    }

    // -- Patterns: checked when merged into the catalog --
    config.custom_patterns = raw.patterns;

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(format!(
                "[discovery] max_depth = {depth} is out of range (1-{}). Using default ({}).",
                constants::ABSOLUTE_MAX_DEPTH,
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Discovery: max_files --
    if let Some(files) = raw.discovery.max_files {
        if (constants::MIN_MAX_FILES..=constants::ABSOLUTE_MAX_FILES).contains(&files) {
            config.max_files = files;
        } else {
            warnings.push(format!(
                "[discovery] max_files = {files} is out of range ({}-{}). Using default ({}).",
                constants::MIN_MAX_FILES,
                constants::ABSOLUTE_MAX_FILES,
                constants::DEFAULT_MAX_FILES,
            ));
        }
    }

    // -- Discovery: glob lists --
    if let Some(include) = raw.discovery.include_patterns {
        config.include_patterns = include;
    }
    if let Some(exclude) = raw.discovery.exclude_patterns {
        config.exclude_patterns = exclude;
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    // -- Logging: file --
    config.log_file = raw.logging.file.filter(|f| !f.trim().is_empty());

    (config, warnings)
}
