//! Utilities for sanitizing error messages and storage keys.
//!
//! Failure records carry the fetcher's error text verbatim, so it is cleaned of
//! control characters and capped in length before it is stored.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Removes control characters (0x00-0x1F except tab, newline, carriage return).
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 || code == 0x09 || code == 0x0A || code == 0x0D
        })
        .collect()
}

/// Sanitizes a message and truncates it to `MAX_ERROR_MESSAGE_LENGTH` bytes.
///
/// Truncation happens on a character boundary and appends the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);

    if sanitized.len() <= MAX_ERROR_MESSAGE_LENGTH {
        return sanitized;
    }

    // Leave room for the truncation note
    let mut cut = MAX_ERROR_MESSAGE_LENGTH.saturating_sub(50);
    while !sanitized.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}... (truncated, original length: {} chars)",
        &sanitized[..cut],
        sanitized.chars().count()
    )
}

/// Maps an artifact key onto a safe file name.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Returns `None` for keys that would be empty or consist only of dots.
pub fn sanitize_key(key: &str) -> Option<String> {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        None
    } else {
        Some(cleaned)
    }
}
