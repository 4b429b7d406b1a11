//! Text helpers for log previews and run summaries

use std::time::Duration;

/// Truncate `text` to at most `max_chars` characters, appending `...` when cut
///
/// Counts characters rather than bytes so multi-byte input never splits.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((idx, _)) => format!("{}...", &text[..idx]),
    }
}

/// Format a duration as `45s`, `2m 5s` or `1h 1m`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }
    if secs < 3600 {
        return format!("{}m {}s", secs / 60, secs % 60);
    }
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}
