//! Usage and rate limit detection in system entries.
//!
//! Purely a text heuristic: it will both miss limit notices and flag
//! messages that merely mention limits.

use crate::entry::TranscriptEntry;

/// Phrases that mark a limit notice regardless of subtype or level.
const LIMIT_PHRASES: &[&str] = &["hit your limit", "resets"];

/// Keywords that mark a limit notice on error-flagged entries (case-insensitive).
const ERROR_KEYWORDS: &[&str] = &["limit", "rate"];

/// Return the entry's content if it looks like a limit notice.
///
/// Fires when either:
/// - the entry's `subtype` or `level` is `error` and its content mentions
///   `limit` or `rate` in any case, or
/// - the content contains `hit your limit` or `resets` (case-sensitive).
pub fn detect_limit(entry: &TranscriptEntry) -> Option<String> {
    let content = entry.content_text();
    if content.is_empty() {
        return None;
    }

    if is_error_marked(entry) {
        let lowered = content.to_lowercase();
        if ERROR_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            return Some(content);
        }
    }

    if LIMIT_PHRASES.iter().any(|phrase| content.contains(phrase)) {
        return Some(content);
    }

    None
}

fn is_error_marked(entry: &TranscriptEntry) -> bool {
    let is_error = |field: Option<String>| {
        field.is_some_and(|value| value.eq_ignore_ascii_case("error"))
    };
    is_error(entry.subtype()) || is_error(entry.level())
}
