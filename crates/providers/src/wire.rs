use serde::Serialize;
use serde_json::Value;
use shared::agent_api::ChatMessage;

// ── Request types ────────────────────────────────────────────────────

/// Body of the single POST issued per send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatRequest {
    /// Hosted chat-completions style endpoint.
    Messages {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        messages: Vec<ChatMessage>,
        stream: bool,
    },
    /// Local generation endpoint taking a flat prompt.
    Prompt {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        system: String,
        prompt: String,
        stream: bool,
    },
}

impl ChatRequest {
    pub fn is_stream(&self) -> bool {
        match self {
            ChatRequest::Messages { stream, .. } | ChatRequest::Prompt { stream, .. } => *stream,
        }
    }
}

// ── Response extraction ──────────────────────────────────────────────

/// Content of a non-streaming response: `choices[0].message.content`, or the
/// top-level `response` string of the local-server variant.
pub fn message_content(value: &Value) -> Option<&str> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| value.get("response").and_then(Value::as_str))
}

/// Incremental content carried by one streamed object, if any.
pub fn delta_content(value: &Value) -> Option<&str> {
    value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .or_else(|| value.get("response").and_then(Value::as_str))
        .or_else(|| value.pointer("/message/content").and_then(Value::as_str))
}

pub fn is_done(value: &Value) -> bool {
    value.get("done").and_then(Value::as_bool).unwrap_or(false)
}

/// Error string some servers embed in an otherwise successful stream.
pub fn stream_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
