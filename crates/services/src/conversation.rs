//! Send/receive lifecycle on top of the message store.
//!
//! A send appends the user entry and an empty AI placeholder, then the
//! response (or an error) is written into that placeholder. Only one request
//! may be in flight; overlapping sends are rejected.

use shared::message::ChatMessage;
use uuid::Uuid;

use crate::message_store::MessageStore;
use crate::storage::SlotStorage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyInput,
    #[error("a response is still being generated")]
    RequestInFlight,
}

/// Everything the background request needs, captured at send time.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub placeholder_id: Uuid,
    pub input: String,
    /// History before this send, used to build the context window
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    placeholder_id: Uuid,
    streamed_live: bool,
}

pub struct Conversation<S: SlotStorage> {
    store: MessageStore<S>,
    in_flight: Option<InFlight>,
}

impl<S: SlotStorage> Conversation<S> {
    pub fn new(store: MessageStore<S>) -> Self {
        Self {
            store,
            in_flight: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn store(&self) -> &MessageStore<S> {
        &self.store
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_placeholder(&self) -> Option<Uuid> {
        self.in_flight.map(|f| f.placeholder_id)
    }

    pub fn last_response(&self) -> Option<&str> {
        self.store.last_response()
    }

    pub fn begin_send(&mut self, raw_input: &str) -> Result<OutgoingRequest, SendRejected> {
        let input = raw_input.trim();
        if input.is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        if self.in_flight.is_some() {
            return Err(SendRejected::RequestInFlight);
        }

        let history = self.store.messages().to_vec();
        let placeholder = ChatMessage::placeholder();
        let placeholder_id = placeholder.id;

        self.store.append(ChatMessage::user(input));
        self.store.append(placeholder);
        self.in_flight = Some(InFlight {
            placeholder_id,
            streamed_live: false,
        });
        self.save();

        tracing::info!(chars = input.len(), context = history.len(), "chat send started");
        Ok(OutgoingRequest {
            placeholder_id,
            input: input.to_string(),
            history,
        })
    }

    /// Show live streamed text in the placeholder. Not persisted per delta.
    pub fn apply_stream_update(&mut self, placeholder_id: Uuid, visible: &str) {
        let Some(flight) = self.in_flight.as_mut() else {
            tracing::debug!(%placeholder_id, "stream update with nothing in flight");
            return;
        };
        if flight.placeholder_id != placeholder_id {
            tracing::debug!(%placeholder_id, "stream update for stale request");
            return;
        }
        flight.streamed_live = true;
        self.store.update(placeholder_id, |m| {
            m.text = visible.to_string();
            m.is_displayed = true;
            m.is_animating = false;
        });
    }

    /// Write the final answer. Returns true when the entry should be revealed
    /// by the typing animation.
    pub fn complete(&mut self, placeholder_id: Uuid, text: &str) -> bool {
        let Some(flight) = self.take_flight(placeholder_id) else {
            return false;
        };
        let animate = !flight.streamed_live;
        self.store.update(placeholder_id, |m| {
            m.text = text.to_string();
            m.is_animating = animate;
            m.is_displayed = !animate;
        });
        self.save();
        tracing::info!(chars = text.len(), animate, "chat response received");
        animate
    }

    /// Replace the placeholder with a visible error entry.
    pub fn fail(&mut self, placeholder_id: Uuid, message: &str) {
        if self.take_flight(placeholder_id).is_none() {
            return;
        }
        self.store.update(placeholder_id, |m| {
            m.text = message.to_string();
            m.is_animating = false;
            m.is_displayed = true;
        });
        self.save();
    }

    /// Reveal has started; never animate this entry again.
    pub fn mark_displayed(&mut self, id: Uuid) {
        self.store.update(id, |m| m.is_displayed = true);
    }

    pub fn finish_animation(&mut self, id: Uuid) {
        if self.store.update(id, |m| {
            m.is_animating = false;
            m.is_displayed = true;
        }) {
            self.save();
        }
    }

    /// Wipe history. A response still in flight is dropped when it arrives.
    pub fn clear(&mut self) {
        self.in_flight = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to remove persisted chat history");
        }
    }

    fn take_flight(&mut self, placeholder_id: Uuid) -> Option<InFlight> {
        match self.in_flight {
            Some(flight) if flight.placeholder_id == placeholder_id => self.in_flight.take(),
            _ => {
                tracing::debug!(%placeholder_id, "ignoring response for a request no longer pending");
                None
            }
        }
    }

    fn save(&self) {
        if let Err(e) = self.store.persist() {
            tracing::warn!(error = %e, "failed to persist chat history");
        }
    }
}
