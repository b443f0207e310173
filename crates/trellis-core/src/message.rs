use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Who produced a message.
///
/// Resolved once when the message is built; routing code matches on this tag
/// instead of probing message content.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Author {
    /// The end user driving the conversation.
    User,
    /// The graph node that produced the message.
    Agent { id: NodeId },
}

impl Author {
    pub fn agent(id: impl Into<NodeId>) -> Self {
        Self::Agent { id: id.into() }
    }

    /// The producing node id, if the author is an agent.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::Agent { id } => Some(id),
            Self::User => None,
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent { id } => write!(f, "{id}"),
        }
    }
}

/// One turn in the conversation log.
///
/// Immutable once appended to a [`State`](crate::state::State); the sequence
/// index is assigned at append time and is strictly increasing within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub content: String,
    sequence: u64,
}

impl Message {
    /// Build a user-authored message. The sequence index is assigned on append.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            content: content.into(),
            sequence: 0,
        }
    }

    /// Build an agent-authored message. The sequence index is assigned on append.
    pub fn agent(id: impl Into<NodeId>, content: impl Into<String>) -> Self {
        Self {
            author: Author::agent(id),
            content: content.into(),
            sequence: 0,
        }
    }

    /// Position of this message in the run's append order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_tags() {
        let m = Message::user("hello");
        assert_eq!(m.author, Author::User);
        assert_eq!(m.author.agent_id(), None);

        let m = Message::agent("coder", "done");
        assert_eq!(m.author.agent_id(), Some("coder"));
        assert_eq!(m.author.to_string(), "coder");
    }

    #[test]
    fn test_author_serde_tagged() {
        let json = serde_json::to_string(&Author::agent("searcher")).unwrap();
        assert!(json.contains(r#""type":"agent""#));
        let back: Author = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Author::agent("searcher"));
    }
}
