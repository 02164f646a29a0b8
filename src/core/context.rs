// ActLens - core/context.rs
//
// Context windows around a failure line.
// Core layer: pure functions over already-split lines.
//
// Rendering: every line is "N: text" with a 1-based line number; the target
// line itself is "N:>text" so formatters can highlight it.

use crate::util::constants;

/// Render the window of `window` lines either side of `center`, including
/// the marked center line itself.
///
/// An out-of-range `center` yields an empty vector. The window is clamped at
/// the start and end of the log.
pub fn context<S: AsRef<str>>(lines: &[S], center: usize, window: usize) -> Vec<String> {
    if center >= lines.len() {
        return Vec::new();
    }

    let (start, end) = bounds(lines.len(), center, window);
    (start..end)
        .map(|idx| {
            if idx == center {
                render_target(idx, lines[idx].as_ref())
            } else {
                render_line(idx + 1, lines[idx].as_ref())
            }
        })
        .collect()
}

/// The rendered lines before and after `center`, without the center line.
///
/// This is the shape stored on a `Failure` (`context_before`,
/// `context_after`). Out-of-range `center` yields two empty vectors.
pub fn surrounding<S: AsRef<str>>(
    lines: &[S],
    center: usize,
    window: usize,
) -> (Vec<String>, Vec<String>) {
    surrounding_numbered(lines, center, window, |idx| idx + 1)
}

/// [`surrounding`] for lines lifted out of a larger log: `number_of(idx)`
/// gives the 1-based log line number printed for `lines[idx]`.
pub fn surrounding_numbered<S: AsRef<str>>(
    lines: &[S],
    center: usize,
    window: usize,
    number_of: impl Fn(usize) -> usize,
) -> (Vec<String>, Vec<String>) {
    if center >= lines.len() {
        return (Vec::new(), Vec::new());
    }

    let (start, end) = bounds(lines.len(), center, window);
    let before = (start..center)
        .map(|idx| render_line(number_of(idx), lines[idx].as_ref()))
        .collect();
    let after = (center + 1..end)
        .map(|idx| render_line(number_of(idx), lines[idx].as_ref()))
        .collect();
    (before, after)
}

/// Half-open `[start, end)` index range of the window.
fn bounds(len: usize, center: usize, window: usize) -> (usize, usize) {
    let start = center.saturating_sub(window);
    let end = center.saturating_add(window).saturating_add(1).min(len);
    (start, end)
}

fn render_line(number: usize, text: &str) -> String {
    format!("{number}: {}", clip(text))
}

fn render_target(idx: usize, text: &str) -> String {
    format!("{}:>{}", idx + 1, clip(text))
}

fn clip(text: &str) -> std::borrow::Cow<'_, str> {
    truncate_chars(text, constants::MAX_CONTEXT_LINE_CHARS)
}

/// Truncate `text` to at most `max_chars` characters, appending the
/// truncation suffix when anything was cut. Never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => std::borrow::Cow::Borrowed(text),
        Some((byte_idx, _)) => {
            let mut owned = text[..byte_idx].to_string();
            owned.push_str(constants::TRUNCATION_SUFFIX);
            std::borrow::Cow::Owned(owned)
        }
    }
}
