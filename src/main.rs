// ActLens - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and --context-lines override
// 3. Logging initialisation (debug mode support)
// 4. Pattern catalog construction (built-in + [patterns] from config)
// 5. Subcommand dispatch
//
// Exit status: 0 on success, 1 when the analysed run failed (or a comparison
// found new failures), 2 when the command itself could not complete.

use actlens::app::batch;
use actlens::core::patterns::PatternCatalog;
use actlens::core::{analyzer, discovery, export, extractor};
use actlens::platform::config::{self, AppConfig, PlatformPaths};
use actlens::platform::fs;
use actlens::util;
use actlens::util::error::{ExportError, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

const EXIT_OK: i32 = 0;
const EXIT_RUN_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// ActLens - structured failure reports from local GitHub Actions runs.
///
/// Feed it the output of `act` (or any CI log) and get the workflow / job /
/// step tree with every detected failure, its location, context and stack
/// trace.
#[derive(Parser, Debug)]
#[command(name = "actlens", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lines of context captured around each failure (0-50).
    #[arg(long = "context-lines", global = true, value_name = "N")]
    context_lines: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a log into workflows, jobs, steps and failures.
    Analyze {
        log: PathBuf,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
        /// Also write one CSV row per failure to FILE.
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
        /// Also save the result as JSON to FILE (usable as a compare baseline).
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// List failures in a log without workflow segmentation.
    Extract {
        log: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Compare two runs. Each argument is a saved .json result or a raw log.
    Compare {
        current: PathBuf,
        baseline: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Analyse every log file under a directory.
    Batch {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let (config_path, (mut app_config, mut warnings)) = match &cli.config {
        Some(path) => {
            let mut loaded = config::load_config_from(path);
            if !path.exists() {
                loaded.1.push(format!(
                    "Config file '{}' does not exist. Using defaults.",
                    path.display()
                ));
            }
            (path.clone(), loaded)
        }
        None => {
            let paths = PlatformPaths::resolve();
            (paths.config_file(), config::load_config(&paths))
        }
    };
    if let Some(lines) = cli.context_lines {
        warnings.extend(app_config.override_context_lines(lines));
    }

    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::debug!(
        version = util::constants::APP_VERSION,
        config = %config_path.display(),
        context_lines = app_config.context_lines,
        "ActLens starting"
    );
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    let catalog = PatternCatalog::builtin().merge(&app_config.custom_patterns);
    tracing::debug!(
        patterns = catalog.pattern_count(),
        diagnostics = catalog.diagnostics().len(),
        "Pattern catalog ready"
    );

    let code = match run(&cli.command, &app_config, &catalog) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

fn run(command: &Command, app_config: &AppConfig, catalog: &PatternCatalog) -> Result<i32> {
    let extract_config = app_config.extract_config();

    match command {
        Command::Analyze {
            log,
            json,
            csv,
            save,
        } => {
            let text = fs::read_log(log)?;
            let mut result = analyzer::analyze_log(&text, catalog, &extract_config);
            result.log_path = Some(log.display().to_string());

            if let Some(path) = save {
                let mut file = fs::create_export_file(path)?;
                export::export_json(&result, &mut file, path)?;
                flush(&mut file, path)?;
                tracing::info!(path = %path.display(), "Result saved");
            }
            if let Some(path) = csv {
                let mut file = fs::create_export_file(path)?;
                let rows = export::export_failures_csv(&result, &mut file, path)?;
                flush(&mut file, path)?;
                tracing::info!(path = %path.display(), rows, "Failures exported");
            }

            if *json {
                export::export_json(&result, std::io::stdout().lock(), stdout_path())?;
            } else {
                export::write_summary(&result, std::io::stdout().lock()).map_err(stdout_err)?;
            }

            Ok(if result.success {
                EXIT_OK
            } else {
                EXIT_RUN_FAILED
            })
        }

        Command::Extract { log, json } => {
            let text = fs::read_log(log)?;
            let failures = extractor::extract_failures(&text, catalog, &extract_config);
            if *json {
                export::export_json(&failures, std::io::stdout().lock(), stdout_path())?;
            } else {
                export::write_failure_list(&failures, std::io::stdout().lock())
                    .map_err(stdout_err)?;
            }
            Ok(EXIT_OK)
        }

        Command::Compare {
            current,
            baseline,
            json,
        } => {
            let current = load_or_analyze(current, catalog, app_config)?;
            let baseline = load_or_analyze(baseline, catalog, app_config)?;
            let diff = analyzer::compare_execution_results(&current, &baseline);
            if *json {
                export::export_json(&diff, std::io::stdout().lock(), stdout_path())?;
            } else {
                export::write_diff_summary(&diff, std::io::stdout().lock()).map_err(stdout_err)?;
            }
            Ok(if diff.new_errors.is_empty() {
                EXIT_OK
            } else {
                EXIT_RUN_FAILED
            })
        }

        Command::Batch { dir, json } => {
            let (paths, warnings) =
                discovery::discover_logs(dir, &app_config.discovery_config())?;
            for warning in &warnings {
                tracing::warn!(warning = %warning, "Discovery warning");
            }

            let outcomes = batch::analyze_files(&paths, catalog, &extract_config);
            if *json {
                let report: Vec<_> = outcomes.iter().map(batch::BatchOutcome::report).collect();
                export::export_json(&report, std::io::stdout().lock(), stdout_path())?;
            } else {
                write_batch_summary(&outcomes, std::io::stdout().lock()).map_err(stdout_err)?;
            }

            Ok(if outcomes.iter().all(batch::BatchOutcome::succeeded) {
                EXIT_OK
            } else {
                EXIT_RUN_FAILED
            })
        }
    }
}

/// A `.json` argument is a saved result; anything else is a log to analyse.
fn load_or_analyze(
    path: &Path,
    catalog: &PatternCatalog,
    app_config: &AppConfig,
) -> Result<actlens::core::model::ExecutionResult> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        return Ok(fs::load_result(path)?);
    }
    Ok(batch::analyze_file(path, catalog, &app_config.extract_config())?)
}

fn write_batch_summary<W: Write>(outcomes: &[batch::BatchOutcome], mut writer: W) -> std::io::Result<()> {
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => writeln!(
                writer,
                "{} {} ({} failure(s))",
                if result.success { "ok   " } else { "FAIL " },
                outcome.path.display(),
                result.total_failures()
            )?,
            Err(e) => writeln!(writer, "ERROR {e}")?,
        }
    }
    let passed = outcomes.iter().filter(|o| o.succeeded()).count();
    writeln!(writer, "{passed}/{} run(s) succeeded", outcomes.len())
}

fn flush<W: Write>(writer: &mut W, path: &Path) -> std::result::Result<(), ExportError> {
    writer.flush().map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn stdout_path() -> &'static Path {
    Path::new("<stdout>")
}

fn stdout_err(e: std::io::Error) -> ExportError {
    ExportError::Io {
        path: stdout_path().to_path_buf(),
        source: e,
    }
}
