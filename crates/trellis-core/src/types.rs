use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node identifier, unique within one graph.
pub type NodeId = String;

/// Textual token a decision capability returns to end a run.
/// Matched case-insensitively during token resolution.
pub const FINISH: &str = "FINISH";

/// Unique identifier for one graph run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A routing destination: either a node in the graph or the end of the run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// Route to the named node.
    Node { id: NodeId },
    /// Terminal sentinel: stop the run and return the state.
    End,
}

impl Target {
    /// Build a node target.
    pub fn node(id: impl Into<NodeId>) -> Self {
        Self::Node { id: id.into() }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// The node id, if this target is a node.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Node { id } => Some(id),
            Self::End => None,
        }
    }

    /// Whether a normalized routing token names this target.
    ///
    /// Node ids match case-insensitively; `End` matches the `FINISH` token.
    pub fn matches_token(&self, token: &str) -> bool {
        match self {
            Self::Node { id } => id.eq_ignore_ascii_case(token),
            Self::End => token.eq_ignore_ascii_case(FINISH),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node { id } => write!(f, "{id}"),
            Self::End => write!(f, "{FINISH}"),
        }
    }
}
