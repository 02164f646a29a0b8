// ActLens - core/stacktrace.rs
//
// Stack-trace association: find a trace block that belongs to a failure line.
// Core layer: pure functions over already-split lines.
//
// Dialects:
//   - Python: "Traceback (most recent call last):" header, indented
//     `File "...", line N, in ...` frames with their source lines, terminated
//     by a non-indented `ExceptionType: message` line.
//   - JavaScript: contiguous `    at frame (file:line:col)` lines.
//
// Search is bounded: a Python header is looked for at most
// STACK_TRACE_LOOKBEHIND lines above the failure (the failure is usually the
// exception line at the bottom of the traceback), and any trace may start at
// most STACK_TRACE_LOOKAHEAD lines below it, and never at or past the next
// failure line.

use crate::util::constants;
use regex::Regex;
use std::sync::OnceLock;

struct TracePatterns {
    py_header: Regex,
    py_frame: Regex,
    py_terminator: Regex,
    js_frame: Regex,
}

impl TracePatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            py_header: Regex::new(r"^\s*Traceback \(most recent call last\):\s*$")?,
            py_frame: Regex::new(r#"^\s+File "[^"]*", line \d+"#)?,
            py_terminator: Regex::new(r"^[A-Za-z_][\w.]*(?::.*)?$")?,
            js_frame: Regex::new(r"^\s+at\s+(?:.+\s\()?\S+:\d+:\d+\)?\s*$")?,
        })
    }
}

fn patterns() -> Option<&'static TracePatterns> {
    static PATTERNS: OnceLock<Option<TracePatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            TracePatterns::compile()
                .map_err(|e| tracing::error!(error = %e, "Failed to compile stack-trace patterns"))
                .ok()
        })
        .as_ref()
}

/// Find a stack trace associated with the failure at `start`.
///
/// Tries, in order:
/// 1. a Python traceback whose block covers `start` (header above it);
/// 2. the first Python traceback or JavaScript frame run beginning within
///    the lookahead window at or below `start`.
///
/// Returns the captured block verbatim, lines joined with `\n`, or `None`.
pub fn find_stack_trace<S: AsRef<str>>(lines: &[S], start: usize) -> Option<String> {
    find_stack_trace_before(lines, start, lines.len())
}

/// Like [`find_stack_trace`], but a trace found below `start` must end
/// before line index `limit`.
///
/// The extractor passes the index of the next failure line, so a trace that
/// belongs to that failure is never also attached to this one.
pub fn find_stack_trace_before<S: AsRef<str>>(
    lines: &[S],
    start: usize,
    limit: usize,
) -> Option<String> {
    let limit = limit.min(lines.len());
    if start >= limit {
        return None;
    }
    let pats = patterns()?;

    // 1. Python traceback ending at or below the failure line.
    let floor = start.saturating_sub(constants::STACK_TRACE_LOOKBEHIND);
    for header in (floor..=start).rev() {
        if pats.py_header.is_match(lines[header].as_ref()) {
            if let Some(end) = python_block_end(lines, header, pats) {
                if end >= start {
                    return Some(join(&lines[header..=end]));
                }
            }
            // Nearest header did not cover the failure; older ones won't either.
            break;
        }
    }

    // 2. Trace starting at or just below the failure line, ending above `limit`.
    let ceiling = start
        .saturating_add(constants::STACK_TRACE_LOOKAHEAD)
        .min(limit - 1);
    for idx in start..=ceiling {
        let line = lines[idx].as_ref();
        if pats.py_header.is_match(line) {
            match python_block_end(lines, idx, pats) {
                Some(end) if end < limit => return Some(join(&lines[idx..=end])),
                // Terminated by (or past) the next failure: that one owns it.
                Some(_) => return None,
                None => {}
            }
        } else if pats.js_frame.is_match(line) {
            let end = js_block_end(lines, idx, pats).min(limit - 1);
            return Some(join(&lines[idx..=end]));
        }
    }

    None
}

/// Index of the terminator line of the Python traceback starting at `header`,
/// or `None` if the block has no frames or no terminator within bounds.
fn python_block_end<S: AsRef<str>>(
    lines: &[S],
    header: usize,
    pats: &TracePatterns,
) -> Option<usize> {
    let limit = header
        .saturating_add(constants::MAX_STACK_TRACE_LINES)
        .min(lines.len());
    let mut frames = 0usize;

    for (idx, line) in lines.iter().enumerate().take(limit).skip(header + 1) {
        let line = line.as_ref();
        if pats.py_frame.is_match(line) {
            frames += 1;
            continue;
        }
        if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            // Source line or caret marker under a frame.
            continue;
        }
        if frames > 0 && pats.py_terminator.is_match(line) {
            return Some(idx);
        }
        return None;
    }
    None
}

/// Index of the last line of the contiguous JavaScript frame run at `first`.
fn js_block_end<S: AsRef<str>>(lines: &[S], first: usize, pats: &TracePatterns) -> usize {
    let limit = first
        .saturating_add(constants::MAX_STACK_TRACE_LINES)
        .min(lines.len());
    let mut end = first;
    for (idx, line) in lines.iter().enumerate().take(limit).skip(first + 1) {
        if !pats.js_frame.is_match(line.as_ref()) {
            break;
        }
        end = idx;
    }
    end
}

fn join<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}
