//! Small text helpers shared across the tool surface.

/// First line of a possibly multi-line tool argument, trimmed.
///
/// Tool arguments arrive from the calling agent and occasionally carry stray
/// newlines; everything after the first line is discarded.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Truncate to at most `max` characters, appending `…` when shortened.
///
/// Used for log previews only; never applied to user-submitted feedback.
pub fn truncate_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
