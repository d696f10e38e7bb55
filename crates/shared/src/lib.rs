pub mod message;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_true() -> bool {
        true
    }

    /// How the request body carries the conversation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestShape {
        /// Hosted chat endpoint: `{"messages": [...]}`
        Messages,
        /// Local generation endpoint: `{"prompt": "...", "system": "..."}`
        Prompt,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChatConfig {
        pub endpoint: String,
        pub shape: RequestShape,
        pub stream: bool,
        pub system_prompt: String,
        /// Number of most recent messages sent as context
        pub history_window: usize,
        pub model: Option<String>,
        pub api_key: Option<String>,
        /// Marker separating hidden reasoning from the visible answer
        pub reasoning_delimiter: Option<String>,
        pub request_timeout_secs: u64,
    }

    impl Default for ChatConfig {
        fn default() -> Self {
            Self {
                endpoint: "http://127.0.0.1:11434/v1/chat/completions".into(),
                shape: RequestShape::Messages,
                stream: false,
                system_prompt: "You are a concise assistant living in the menu bar. \
                    Answer briefly and clearly."
                    .into(),
                history_window: 10,
                model: None,
                api_key: None,
                reasoning_delimiter: Some("</think>".into()),
                request_timeout_secs: 120,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WindowSettings {
        pub collapsed_size: [f32; 2],
        pub expanded_size: [f32; 2],
        /// Gap between the top of the display and the window
        pub top_margin: f32,
        pub animation_ms: u64,
        /// Opacity the bubble settles at when collapsed. Raise it on
        /// displays without a notch so the bubble stays visible.
        pub collapsed_opacity: f32,
    }

    impl Default for WindowSettings {
        fn default() -> Self {
            Self {
                collapsed_size: [180.0, 34.0],
                expanded_size: [420.0, 520.0],
                top_margin: 0.0,
                animation_ms: 250,
                collapsed_opacity: 0.0,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TypingSettings {
        pub tick_ms: u64,
        #[serde(default = "default_true")]
        pub enabled: bool,
    }

    impl Default for TypingSettings {
        fn default() -> Self {
            Self {
                tick_ms: 40,
                enabled: true,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ScrollSettings {
        /// Distance from the bottom, in points, that still counts as "at the bottom"
        pub threshold: f32,
    }

    impl Default for ScrollSettings {
        fn default() -> Self {
            Self { threshold: 50.0 }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AppSettings {
        pub chat: ChatConfig,
        pub window: WindowSettings,
        pub typing: TypingSettings,
        pub scroll: ScrollSettings,
        pub dark_mode: bool,
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
            Self {
                role: role.into(),
                content: content.into(),
            }
        }
    }

    /// Incremental output published while a streamed response is consumed.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StreamChunk {
        /// The full user-visible text accumulated so far
        Visible(String),
    }
}

#[cfg(test)]
mod tests {
    use super::settings::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let json = r#"{"chat": {"endpoint": "http://localhost:8080/api/generate", "shape": "prompt"}}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.chat.shape, RequestShape::Prompt);
        assert_eq!(settings.chat.history_window, 10);
        assert_eq!(settings.scroll.threshold, 50.0);
        assert_eq!(settings.typing.tick_ms, 40);
        assert_eq!(settings.chat.reasoning_delimiter.as_deref(), Some("</think>"));
    }

    #[test]
    fn test_empty_object_is_default() {
        let settings: AppSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.window.animation_ms, 250);
        assert_eq!(settings.window.collapsed_opacity, 0.0);
        assert!(!settings.chat.stream);
    }
}
