use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::types::NodeId;

/// Conversation state for one graph run.
///
/// An append-only message log plus a routing hint. One instance per run,
/// owned by the execution engine; nodes receive a shared reference and return
/// a [`PartialResult`] that the engine merges back in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    messages: Vec<Message>,
    next_hint: Option<NodeId>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state from initial messages, assigning sequence indices in order.
    pub fn from_messages(initial: Vec<Message>) -> Self {
        let mut state = Self::new();
        for msg in initial {
            state.append(msg);
        }
        state
    }

    /// Append a message, assigning the next sequence index (previous max + 1).
    pub fn append(&mut self, message: Message) {
        let next = self
            .messages
            .last()
            .map(|m| m.sequence() + 1)
            .unwrap_or(0);
        self.messages.push(message.with_sequence(next));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Consume the state, returning the full message log.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// The routing hint left by the most recent node, if any.
    pub fn next_hint(&self) -> Option<&str> {
        self.next_hint.as_deref()
    }

    /// Overwrite the routing hint.
    pub fn set_next_hint(&mut self, hint: impl Into<NodeId>) {
        self.next_hint = Some(hint.into());
    }
}

/// What a node execution contributes back to the state.
///
/// Messages are appended in order; a hint, when present, overwrites the
/// state's `next_hint` and is how a node communicates a routing preference
/// without embedding control tokens in message content.
#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    pub messages: Vec<Message>,
    pub next_hint: Option<NodeId>,
}

impl PartialResult {
    /// No messages, no hint.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single message, no hint.
    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
            next_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<NodeId>) -> Self {
        self.next_hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_increasing_sequence() {
        let mut state = State::new();
        state.append(Message::user("one"));
        state.append(Message::agent("coder", "two"));
        state.append(Message::agent("searcher", "three"));

        let seqs: Vec<u64> = state.messages().iter().map(|m| m.sequence()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(state.messages()[1].content, "two");
    }

    #[test]
    fn test_from_messages_sequences_in_order() {
        let state = State::from_messages(vec![
            Message::user("a"),
            Message::user("b"),
        ]);
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[0].sequence(), 0);
        assert_eq!(state.messages()[1].sequence(), 1);
    }

    #[test]
    fn test_next_hint_overwrite() {
        let mut state = State::new();
        assert_eq!(state.next_hint(), None);
        state.set_next_hint("coder");
        assert_eq!(state.next_hint(), Some("coder"));
        state.set_next_hint("searcher");
        assert_eq!(state.next_hint(), Some("searcher"));
    }

    #[test]
    fn test_partial_result_builders() {
        let p = PartialResult::message(Message::agent("chat", "hi")).with_hint("coder");
        assert_eq!(p.messages.len(), 1);
        assert_eq!(p.next_hint.as_deref(), Some("coder"));
        assert!(PartialResult::none().messages.is_empty());
    }
}
