//! Chat entries as shown in the panel and stored on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in the conversation.
///
/// User entries are always displayed and never animate. AI entries start as
/// empty placeholders and are filled in place once a response arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub is_animating: bool,
    pub is_displayed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user: true,
            is_animating: false,
            is_displayed: true,
            created_at: Utc::now(),
        }
    }

    /// Empty AI entry rendered as a "generating" indicator.
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            is_user: false,
            is_animating: false,
            is_displayed: false,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::placeholder()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !self.is_user && self.text.is_empty()
    }

    /// Wire role for this entry
    pub fn role(&self) -> &'static str {
        if self.is_user {
            "user"
        } else {
            "assistant"
        }
    }

    /// Flags for history replayed from storage: shown at once, never re-animated.
    pub fn mark_restored(&mut self) {
        self.is_displayed = true;
        self.is_animating = false;
    }
}
