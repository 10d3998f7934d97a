//! Error text shown to the user when a provider call fails
//!
//! Error values travel into the editor buffer and the status line, so the
//! helpers here produce plain text. Terminal styling is applied by the
//! front end.

use crate::config::constants::display;
use crate::utils::head_chars;

/// Raw reply body capped for display
pub fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    let head = head_chars(trimmed, display::ERROR_BODY_LIMIT);
    if head.len() == trimmed.len() {
        head.to_string()
    } else {
        format!("{head}...")
    }
}

/// Prefix an error with the wire format that produced it
pub fn format_llm_error(provider: &str, error: &str) -> String {
    format!("{provider}: {error}")
}

/// Error message for a reply that carried neither text nor a provider error
pub fn unexpected_reply(provider: &str, body: &str) -> String {
    format_llm_error(
        provider,
        &format!("Unexpected response: {}", body_excerpt(body)),
    )
}
