//! Ordered chat history with single-slot persistence.
//!
//! The full sequence is encoded as one blob under one key. Restored entries
//! are always marked displayed and non-animating so replayed history renders
//! at once instead of re-running the reveal animation.

use shared::message::ChatMessage;
use uuid::Uuid;

use crate::storage::SlotStorage;

pub const DEFAULT_SLOT: &str = "chat_history";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode chat history: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which end of the sequence a replace search starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

pub struct MessageStore<S: SlotStorage> {
    messages: Vec<ChatMessage>,
    storage: S,
    key: String,
}

impl<S: SlotStorage> MessageStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_SLOT)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            storage,
            key: key.into(),
        }
    }

    /// Create a store and load whatever history the slot holds.
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.restore();
        store
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Add to the end. Not persisted until `persist` is called.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Overwrite the first match in `direction` in place. Returns false when
    /// nothing matched.
    pub fn replace_where<P>(
        &mut self,
        direction: SearchDirection,
        predicate: P,
        message: ChatMessage,
    ) -> bool
    where
        P: Fn(&ChatMessage) -> bool,
    {
        let pos = match direction {
            SearchDirection::Forward => self.messages.iter().position(|m| predicate(m)),
            SearchDirection::Backward => self.messages.iter().rposition(|m| predicate(m)),
        };
        match pos {
            Some(i) => {
                self.messages[i] = message;
                true
            }
            None => false,
        }
    }

    pub fn replace(&mut self, id: Uuid, message: ChatMessage) -> bool {
        self.replace_where(SearchDirection::Backward, |m| m.id == id, message)
    }

    /// Mutate one entry in place.
    pub fn update<F>(&mut self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut ChatMessage),
    {
        match self.messages.iter_mut().rev().find(|m| m.id == id) {
            Some(msg) => {
                f(msg);
                true
            }
            None => false,
        }
    }

    /// Drop all entries and the persisted blob.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.storage.remove(&self.key)?;
        Ok(())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.messages)?;
        self.storage.write(&self.key, &bytes)?;
        Ok(())
    }

    /// Reload from the slot. Missing or corrupt data yields an empty history.
    pub fn restore(&mut self) {
        self.messages = match self.storage.read(&self.key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<ChatMessage>>(&bytes) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(error = %e, slot = %self.key, "discarding unreadable chat history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, slot = %self.key, "failed to read chat history");
                Vec::new()
            }
        };
        for msg in &mut self.messages {
            msg.mark_restored();
        }
        tracing::debug!(count = self.messages.len(), "restored chat history");
    }

    /// Text of the newest AI answer, for the copy control.
    pub fn last_response(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.is_user && !m.text.is_empty())
            .map(|m| m.text.as_str())
    }
}
