//! Helpers for user-facing error text and the clipboard.

/// Turn a failure description into the chat entry shown in place of the answer.
///
/// The original description is always included.
pub fn format_error_message(error: &str) -> String {
    let error_lower = error.to_lowercase();

    // API key issues
    if error_lower.contains("unauthorized")
        || error_lower.contains("401")
        || error_lower.contains("invalid api key")
    {
        return format!(
            "I couldn't reach the model - the API key may be missing or wrong.\n\nError: {}",
            error
        );
    }

    // Rate limiting
    if error_lower.contains("rate limit")
        || error_lower.contains("429")
        || error_lower.contains("too many requests")
    {
        return format!(
            "The model is busy right now. Wait a moment and try again.\n\nError: {}",
            error
        );
    }

    if error_lower.contains("invalid endpoint") {
        return format!(
            "The chat endpoint in settings.json isn't a valid URL.\n\nError: {}",
            error
        );
    }

    // Network issues
    if error_lower.contains("connect")
        || error_lower.contains("timed out")
        || error_lower.contains("dns")
    {
        return format!(
            "I couldn't connect to the model server. Is it running?\n\nError: {}",
            error
        );
    }

    format!("Error: {}", error)
}

/// Put text on the system clipboard. Returns false when no clipboard is available.
pub fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text.to_string())) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "clipboard unavailable");
            false
        }
    }
}
