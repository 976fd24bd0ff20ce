//! Utility functions for valor.

use std::path::PathBuf;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Company names from Brazilian exports carry accented characters, so this
/// works on character boundaries instead of byte indices.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Expand `~` and environment variables in a user-supplied path.
///
/// Falls back to the literal input when expansion fails (e.g. an unset
/// variable).
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}
