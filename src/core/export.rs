// ActLens - core/export.rs
//
// JSON, CSV and plain-text rendering of analysis results.
// Core layer: writes to any Write trait object; the caller owns the file.

use crate::core::model::{ExecutionDiff, ExecutionResult, Failure};
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Pretty JSON of any result record (`ExecutionResult`, `ExecutionDiff`,
/// a failure list).
pub fn export_json<T, W>(value: &T, writer: W, export_path: &Path) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    writeln!(writer).map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })
}

/// One CSV row per failure: workflow, job, type, message, file, line.
///
/// Returns the number of data rows written.
pub fn export_failures_csv<W: Write>(
    result: &ExecutionResult,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["workflow", "job", "type", "message", "file", "line"])
        .map_err(csv_err)?;

    let mut count = 0;
    for workflow in &result.workflows {
        for job in &workflow.jobs {
            for failure in &job.failures {
                let line = failure.line_number.map(|n| n.to_string()).unwrap_or_default();
                csv_writer
                    .write_record([
                        workflow.name.as_str(),
                        job.name.as_str(),
                        failure.failure_type.name(),
                        failure.message.as_str(),
                        failure.file_path.as_deref().unwrap_or(""),
                        line.as_str(),
                    ])
                    .map_err(csv_err)?;
                count += 1;
            }
        }
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Short human-readable summary of one execution.
pub fn write_summary<W: Write>(result: &ExecutionResult, mut writer: W) -> io::Result<()> {
    let status = if result.success { "SUCCESS" } else { "FAILED" };
    writeln!(
        writer,
        "{status}: {} workflow(s), {} failure(s), {:.1}s",
        result.workflows.len(),
        result.total_failures(),
        result.total_duration
    )?;

    for workflow in &result.workflows {
        writeln!(writer, "{} {}", mark(workflow.success), workflow.name)?;
        for job in &workflow.jobs {
            writeln!(
                writer,
                "  {} {} ({:.1}s)",
                mark(job.success),
                job.name,
                job.duration
            )?;
            for step in job.steps.iter().filter(|s| !s.success) {
                writeln!(writer, "      step failed: {}", step.name)?;
            }
            for failure in &job.failures {
                write_failure_line(&mut writer, "    - ", failure)?;
            }
        }
    }
    Ok(())
}

/// Flat failure list, one line each, for raw extraction output.
pub fn write_failure_list<W: Write>(failures: &[Failure], mut writer: W) -> io::Result<()> {
    if failures.is_empty() {
        return writeln!(writer, "No failures found.");
    }
    for failure in failures {
        write_failure_line(&mut writer, "", failure)?;
    }
    Ok(())
}

/// Summary of a run-to-run comparison.
pub fn write_diff_summary<W: Write>(diff: &ExecutionDiff, mut writer: W) -> io::Result<()> {
    let sections = [
        ("New", &diff.new_errors),
        ("Resolved", &diff.resolved_errors),
        ("Persistent", &diff.persistent_errors),
    ];
    for (title, failures) in sections {
        writeln!(writer, "{title} ({}):", failures.len())?;
        for failure in failures {
            write_failure_line(&mut writer, "  - ", failure)?;
        }
    }
    Ok(())
}

fn write_failure_line<W: Write>(writer: &mut W, indent: &str, failure: &Failure) -> io::Result<()> {
    match failure.location() {
        Some(location) => writeln!(
            writer,
            "{indent}[{}] {} ({location})",
            failure.failure_type.label(),
            failure.message
        ),
        None => writeln!(
            writer,
            "{indent}[{}] {}",
            failure.failure_type.label(),
            failure.message
        ),
    }
}

fn mark(success: bool) -> &'static str {
    if success {
        "ok  "
    } else {
        "FAIL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FailureType, JobResult, StepResult, WorkflowResult};

    fn sample() -> ExecutionResult {
        let mut located = Failure::new(FailureType::Assertion, "expected 1, got 2");
        located.file_path = Some("tests/test_api.py".to_string());
        located.line_number = Some(42);

        ExecutionResult::new(
            false,
            vec![WorkflowResult {
                name: "CI".to_string(),
                success: false,
                jobs: vec![JobResult {
                    name: "test".to_string(),
                    success: false,
                    failures: vec![located, Failure::new(FailureType::Error, "a, \"quoted\" one")],
                    steps: vec![StepResult {
                        name: "pytest".to_string(),
                        success: false,
                        duration: 4.0,
                        output: None,
                    }],
                    duration: 4.0,
                }],
                duration: 4.0,
            }],
            4.0,
        )
    }

    #[test]
    fn test_csv_export() {
        let mut buf = Vec::new();
        let count = export_failures_csv(&sample(), &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "workflow,job,type,message,file,line");
        assert_eq!(lines[1], "CI,test,assertion,\"expected 1, got 2\",tests/test_api.py,42");
        assert_eq!(lines[2], "CI,test,error,\"a, \"\"quoted\"\" one\",,");
    }

    #[test]
    fn test_json_export_round_trips() {
        let result = sample();
        let mut buf = Vec::new();
        export_json(&result, &mut buf, Path::new("out.json")).unwrap();
        let parsed: ExecutionResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut buf = Vec::new();
        write_summary(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("FAILED: 1 workflow(s), 2 failure(s), 4.0s"), "{text}");
        assert!(text.contains("step failed: pytest"));
        assert!(text.contains("[Assertion] expected 1, got 2 (tests/test_api.py:42)"));
    }

    #[test]
    fn test_failure_list_and_diff() {
        let mut buf = Vec::new();
        write_failure_list(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No failures found.\n");

        let diff = ExecutionDiff {
            new_errors: vec![Failure::new(FailureType::Timeout, "slow")],
            ..Default::default()
        };
        let mut buf = Vec::new();
        write_diff_summary(&diff, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("New (1):\n  - [Timeout] slow\n"));
        assert!(text.contains("Resolved (0):"));
    }
}
