//! State management for the notch chat window
//!
//! `AppState` is owned by the UI thread. Network requests run on a background
//! thread and report back through a channel that is drained once per frame.

use providers::{ChatClient, ChatTransport};
use services::{Conversation, MessageStore, OutgoingRequest, SendRejected, SlotStorage};
use shared::agent_api::StreamChunk;
use shared::message::ChatMessage;
use shared::settings::AppSettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::animator::{Reveal, TypingAnimator};
use crate::hover::{HoverController, PointerTracker};
use crate::scroll::ScrollCoordinator;
use crate::utils::{copy_to_clipboard, format_error_message};
use crate::window::WindowDriver;

const STATUS_TTL: Duration = Duration::from_secs(2);

/// Result from a background chat request, tagged with its placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub placeholder_id: Uuid,
    pub kind: ChatEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEventKind {
    /// Visible text so far of a streamed answer
    Stream(String),
    Completed(String),
    /// User-facing error text
    Failed(String),
}

/// Run one chat request on a background thread (non-blocking for the UI).
pub fn run_chat_request(
    transport: Arc<dyn ChatTransport>,
    request: OutgoingRequest,
    tx: UnboundedSender<ChatEvent>,
) {
    std::thread::spawn(move || {
        let placeholder_id = request.placeholder_id;
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(ChatEvent {
                    placeholder_id,
                    kind: ChatEventKind::Failed(format_error_message(&format!(
                        "failed to start async runtime: {}",
                        e
                    ))),
                });
                return;
            }
        };

        let forward = tx.clone();
        let result = rt.block_on(async move {
            let (chunk_tx, mut chunk_rx) = unbounded_channel::<StreamChunk>();
            let send = transport.send(&request.input, &request.history, chunk_tx);
            // The sender lives inside `send`, so this loop ends when the request does
            let relay = async {
                while let Some(StreamChunk::Visible(text)) = chunk_rx.recv().await {
                    let _ = forward.send(ChatEvent {
                        placeholder_id,
                        kind: ChatEventKind::Stream(text),
                    });
                }
            };
            let (result, ()) = tokio::join!(send, relay);
            result
        });

        let kind = match result {
            Ok(text) => ChatEventKind::Completed(text),
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                ChatEventKind::Failed(format_error_message(&e.to_string()))
            }
        };
        let _ = tx.send(ChatEvent {
            placeholder_id,
            kind,
        });
    });
}

pub struct AppState {
    pub settings: AppSettings,
    pub conversation: Conversation<Arc<dyn SlotStorage>>,
    pub input_text: String,
    pub hover: Option<HoverController>,
    pub window: Option<WindowDriver>,
    pub pointer: PointerTracker,
    pub scroll: ScrollCoordinator,
    transport: Option<Arc<dyn ChatTransport>>,
    config_error: Option<String>,
    animators: HashMap<Uuid, TypingAnimator>,
    events_tx: UnboundedSender<ChatEvent>,
    events_rx: UnboundedReceiver<ChatEvent>,
    status: Option<(String, Instant)>,
}

impl AppState {
    pub fn new(settings: AppSettings, storage: Arc<dyn SlotStorage>) -> Self {
        match ChatClient::new(settings.chat.clone()) {
            Ok(client) => Self::with_transport(settings, storage, Some(Arc::new(client))),
            Err(e) => {
                tracing::error!(error = %e, "chat client unavailable; sends will fail");
                let mut state = Self::with_transport(settings, storage, None);
                state.config_error = Some(e.to_string());
                state
            }
        }
    }

    pub fn with_transport(
        settings: AppSettings,
        storage: Arc<dyn SlotStorage>,
        transport: Option<Arc<dyn ChatTransport>>,
    ) -> Self {
        let conversation = Conversation::new(MessageStore::open(storage));
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            scroll: ScrollCoordinator::new(settings.scroll.threshold),
            settings,
            conversation,
            input_text: String::new(),
            hover: None,
            window: None,
            pointer: PointerTracker::new(),
            transport,
            config_error: None,
            animators: HashMap::new(),
            events_tx,
            events_rx,
            status: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn is_thinking(&self) -> bool {
        self.conversation.is_in_flight()
    }

    pub fn can_send(&self) -> bool {
        !self.input_text.trim().is_empty() && !self.conversation.is_in_flight()
    }

    pub fn send_message(&mut self) {
        let input = std::mem::take(&mut self.input_text);
        let outgoing = match self.conversation.begin_send(&input) {
            Ok(outgoing) => outgoing,
            Err(e) => {
                if e == SendRejected::RequestInFlight {
                    self.set_status(e.to_string());
                }
                self.input_text = input;
                return;
            }
        };

        match &self.transport {
            Some(transport) => {
                run_chat_request(transport.clone(), outgoing, self.events_tx.clone())
            }
            None => {
                let reason = self
                    .config_error
                    .clone()
                    .unwrap_or_else(|| "no chat endpoint configured".to_string());
                self.conversation
                    .fail(outgoing.placeholder_id, &format_error_message(&reason));
            }
        }
    }

    /// Apply everything the background request has reported since last frame.
    pub fn poll_chat_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event.kind {
                ChatEventKind::Stream(text) => self
                    .conversation
                    .apply_stream_update(event.placeholder_id, &text),
                ChatEventKind::Completed(text) => {
                    self.conversation.complete(event.placeholder_id, &text);
                }
                ChatEventKind::Failed(text) => {
                    self.conversation.fail(event.placeholder_id, &text)
                }
            }
        }
    }

    /// Start reveals for freshly completed answers and advance running ones.
    /// Returns true while any reveal is still running.
    pub fn update_reveals(&mut self, now: Instant) -> bool {
        let tick = Duration::from_millis(self.settings.typing.tick_ms.max(1));
        let pending: Vec<ChatMessage> = self
            .conversation
            .messages()
            .iter()
            .filter(|m| m.is_animating && !self.animators.contains_key(&m.id))
            .cloned()
            .collect();

        for msg in pending {
            let reveal = if self.settings.typing.enabled {
                TypingAnimator::start(&msg, tick, now)
            } else {
                Reveal::Immediate
            };
            match reveal {
                Reveal::Animating(animator) => {
                    self.conversation.mark_displayed(msg.id);
                    self.animators.insert(msg.id, animator);
                }
                Reveal::Immediate => self.conversation.finish_animation(msg.id),
            }
        }

        let mut finished = Vec::new();
        for (id, animator) in self.animators.iter_mut() {
            animator.advance(now);
            if animator.is_finished() {
                finished.push(*id);
            }
        }
        for id in finished {
            self.animators.remove(&id);
            self.conversation.finish_animation(id);
        }

        !self.animators.is_empty()
    }

    /// Earliest moment a running reveal needs another frame.
    pub fn next_reveal_tick(&self) -> Option<Instant> {
        self.animators.values().map(|a| a.next_tick()).min()
    }

    /// Stop all reveals, e.g. when the panel collapses. Text stays in the store.
    pub fn cancel_reveals(&mut self) {
        for (_, animator) in self.animators.drain() {
            let id = animator.cancel();
            self.conversation.finish_animation(id);
        }
    }

    /// Text to render for a message, honouring any running reveal.
    pub fn visible_text<'a>(&'a self, msg: &'a ChatMessage) -> &'a str {
        match self.animators.get(&msg.id) {
            Some(animator) => animator.visible_text(),
            None => &msg.text,
        }
    }

    pub fn clear_history(&mut self) {
        self.animators.clear();
        self.conversation.clear();
        tracing::info!("chat history cleared");
    }

    pub fn copy_last_response(&mut self) {
        let Some(text) = self.conversation.last_response() else {
            return;
        };
        if copy_to_clipboard(text) {
            self.set_status("Copied".to_string());
        } else {
            self.set_status("Clipboard unavailable".to_string());
        }
    }

    pub fn set_status(&mut self, text: String) {
        self.status = Some((text, Instant::now()));
    }

    pub fn status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(text, _)| text.as_str())
    }
}
