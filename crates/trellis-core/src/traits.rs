use futures::future::BoxFuture;

use crate::error::Result;
use crate::state::State;
use crate::types::Target;

/// Decision capability — an external oracle proposing the next node.
///
/// Typically backed by an LLM call. The returned token is free-form text;
/// the engine normalizes it and checks it against the edge's allowed targets,
/// so implementations do not need to guarantee a valid node name. Must not
/// mutate engine state; failures surface as `TrellisError::Decision`.
pub trait DecisionCapability: Send + Sync + 'static {
    fn decide<'a>(
        &'a self,
        state: &'a State,
        allowed: &'a [Target],
    ) -> BoxFuture<'a, Result<String>>;
}

/// Action capability — an external worker producing a node's result text.
///
/// Failures surface as `TrellisError::Action`.
pub trait ActionCapability: Send + Sync + 'static {
    fn act<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<String>>;
}
