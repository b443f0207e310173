use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error)]
pub enum TrellisError {
    // Graph construction errors
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Unknown node id: {0}")]
    UnknownNode(NodeId),

    #[error("Graph validation failed: {0}")]
    Validation(#[from] ValidationRule),

    #[error("Unknown graph: {0}")]
    UnknownGraph(String),

    // Run-time errors
    #[error("Node '{node}' execution failed: {source}")]
    NodeExecution {
        node: NodeId,
        #[source]
        source: Box<TrellisError>,
    },

    #[error("Decision capability failed: {0}")]
    Decision(String),

    #[error("Action capability failed: {0}")]
    Action(String),

    #[error("Step budget exceeded after {0} steps")]
    StepBudgetExceeded(usize),

    #[error("Run cancelled")]
    Cancelled,

    // Config errors
    #[error("Config error: {0}")]
    Config(String),
}

/// The specific rule a graph failed to satisfy at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationRule {
    #[error("Entry node '{0}' is not registered")]
    EntryNotRegistered(NodeId),

    #[error("Edge source '{0}' is not registered")]
    EdgeSourceUnknown(NodeId),

    #[error("Edge target '{to}' from '{from}' is not registered")]
    EdgeTargetUnknown { from: NodeId, to: NodeId },

    #[error("Conditional edge from '{from}' allows '{target}' which is outside the graph")]
    TargetOutsideGraph { from: NodeId, target: String },

    #[error("Node '{0}' already has an outgoing edge")]
    DuplicateEdge(NodeId),

    #[error("Fallback target '{target}' from '{from}' is not in the edge's allowed set")]
    FallbackOutsideAllowed { from: NodeId, target: String },

    #[error("Node '{0}' is not reachable from the entry node")]
    Unreachable(NodeId),
}

pub type Result<T> = std::result::Result<T, TrellisError>;

impl TrellisError {
    /// Wrap a failure raised while executing the named node.
    pub fn node_execution(node: impl Into<NodeId>, source: TrellisError) -> Self {
        Self::NodeExecution {
            node: node.into(),
            source: Box::new(source),
        }
    }
}
