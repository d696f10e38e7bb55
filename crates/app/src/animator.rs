//! Word-by-word reveal of a finished response.
//!
//! The animator only decides how much of the text to show. The full text
//! always lives in the message store, so dropping an animator early loses
//! nothing.

use shared::message::ChatMessage;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub enum Reveal {
    /// Already shown once; render the full text right away.
    Immediate,
    Animating(TypingAnimator),
}

pub struct TypingAnimator {
    message_id: Uuid,
    text: String,
    /// Byte offset where each word (with its trailing whitespace) ends
    word_ends: Vec<usize>,
    shown: usize,
    tick: Duration,
    next_tick: Instant,
}

impl TypingAnimator {
    pub fn start(message: &ChatMessage, tick: Duration, now: Instant) -> Reveal {
        if message.is_displayed || !message.is_animating || message.text.is_empty() {
            return Reveal::Immediate;
        }
        let word_ends = word_ends(&message.text);
        Reveal::Animating(Self {
            message_id: message.id,
            text: message.text.clone(),
            shown: 1,
            word_ends,
            tick,
            next_tick: now + tick,
        })
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    /// Reveal one more word per elapsed tick. Returns true when anything changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let before = self.shown;
        while self.shown < self.word_ends.len() && now >= self.next_tick {
            self.shown += 1;
            self.next_tick += self.tick;
        }
        self.shown != before
    }

    pub fn is_finished(&self) -> bool {
        self.shown >= self.word_ends.len()
    }

    pub fn visible_text(&self) -> &str {
        match self.shown.checked_sub(1).and_then(|i| self.word_ends.get(i)) {
            Some(&end) => &self.text[..end],
            None => "",
        }
    }

    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Stop revealing. The stored message is untouched.
    pub fn cancel(self) -> Uuid {
        self.message_id
    }
}

/// Split points after each whitespace-separated word, keeping the whitespace
/// so every revealed prefix is a prefix of the original text.
fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut seen_word = false;
    let mut prev_whitespace = false;
    for (i, c) in text.char_indices() {
        let whitespace = c.is_whitespace();
        if !whitespace && prev_whitespace && seen_word {
            ends.push(i);
        }
        if !whitespace {
            seen_word = true;
        }
        prev_whitespace = whitespace;
    }
    if !text.is_empty() {
        ends.push(text.len());
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(40);

    fn fresh_reply(text: &str) -> ChatMessage {
        let mut msg = ChatMessage::assistant(text);
        msg.is_animating = true;
        msg.is_displayed = false;
        msg
    }

    fn animating(reveal: Reveal) -> TypingAnimator {
        match reveal {
            Reveal::Animating(a) => a,
            Reveal::Immediate => panic!("expected an animation"),
        }
    }

    #[test]
    fn test_word_ends_keep_whitespace() {
        assert_eq!(word_ends("Hello big world"), vec![6, 10, 15]);
        assert_eq!(word_ends("  lead"), vec![6]);
        assert_eq!(word_ends("line one\n\nnext"), vec![5, 10, 14]);
        assert!(word_ends("").is_empty());
    }

    #[test]
    fn test_reveals_one_word_per_tick() {
        let now = Instant::now();
        let mut anim = animating(TypingAnimator::start(&fresh_reply("Hi there friend"), TICK, now));

        assert_eq!(anim.visible_text(), "Hi ");
        assert!(!anim.advance(now + Duration::from_millis(10)));
        assert!(anim.advance(now + TICK));
        assert_eq!(anim.visible_text(), "Hi there ");
        assert!(!anim.is_finished());
        assert!(anim.advance(now + TICK * 2));
        assert_eq!(anim.visible_text(), "Hi there friend");
        assert!(anim.is_finished());
    }

    #[test]
    fn test_late_frame_catches_up() {
        let now = Instant::now();
        let mut anim = animating(TypingAnimator::start(&fresh_reply("a b c d e"), TICK, now));
        anim.advance(now + TICK * 10);
        assert!(anim.is_finished());
        assert_eq!(anim.visible_text(), "a b c d e");
    }

    #[test]
    fn test_displayed_message_renders_immediately() {
        let mut msg = fresh_reply("already seen");
        msg.is_displayed = true;
        assert!(matches!(
            TypingAnimator::start(&msg, TICK, Instant::now()),
            Reveal::Immediate
        ));

        let restored = ChatMessage::assistant("from disk");
        assert!(matches!(
            TypingAnimator::start(&restored, TICK, Instant::now()),
            Reveal::Immediate
        ));
    }

    #[test]
    fn test_cancel_leaves_message_intact() {
        let msg = fresh_reply("one two three");
        let anim = animating(TypingAnimator::start(&msg, TICK, Instant::now()));
        assert_eq!(anim.cancel(), msg.id);
        assert_eq!(msg.text, "one two three");
    }

    #[test]
    fn test_single_word() {
        let anim = animating(TypingAnimator::start(&fresh_reply("Done."), TICK, Instant::now()));
        assert!(anim.is_finished());
        assert_eq!(anim.visible_text(), "Done.");
    }
}
