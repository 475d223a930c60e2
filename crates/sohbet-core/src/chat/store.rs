//! Conversation state management
//!
//! The ordered message log behind atomic update operations. Cheap to clone;
//! the orchestrator task and the UI share one log. The store has no network
//! awareness.

use std::sync::Arc;

use parking_lot::Mutex;

use super::types::Message;

/// Shared, ordered log of conversation messages
///
/// Append-only except for tail replacement while a reply streams and
/// truncation of the last turn during regeneration. Insertion order is
/// display order.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<Vec<Message>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with remotely fetched history
    pub fn seed(&self, messages: Vec<Message>) {
        *self.inner.lock() = messages;
    }

    /// Append a user message followed by its pending assistant placeholder
    ///
    /// Every user turn gets exactly one placeholder, mutated in place by
    /// [`update_tail`](Self::update_tail) as the reply streams.
    pub fn append_user_turn(&self, text: &str) {
        let mut log = self.inner.lock();
        log.push(Message::user(text));
        log.push(Message::placeholder());
    }

    /// Replace the last entry's text and responded flag
    pub fn update_tail(&self, text: &str, responded: bool) {
        let mut log = self.inner.lock();
        if let Some(last) = log.last_mut() {
            last.text = text.to_string();
            last.is_user = false;
            last.responded = Some(responded);
        }
    }

    /// Drop the last user+assistant pair
    pub fn truncate_last_turn(&self) {
        let mut log = self.inner.lock();
        let keep = log.len().saturating_sub(2);
        log.truncate(keep);
    }

    /// Text of the most recent user message, if any
    pub fn last_user_text(&self) -> Option<String> {
        self.inner
            .lock()
            .iter()
            .rev()
            .find(|m| m.is_user)
            .map(|m| m.text.clone())
    }

    /// Snapshot of the log for rendering
    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
