use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use trellis_core::error::Result;
use trellis_core::message::Message;
use trellis_core::state::{PartialResult, State};
use trellis_core::traits::ActionCapability;
use trellis_core::types::NodeId;

use trellis_graph::{NodeExecutor, RouteDecider};

/// A worker node backed by an action capability.
///
/// Runs the action over the current state and appends one message authored by
/// this node. Routing is left entirely to the node's outgoing edge.
pub struct AgentNode {
    id: NodeId,
    action: Arc<dyn ActionCapability>,
}

impl AgentNode {
    pub fn new(id: impl Into<NodeId>, action: Arc<dyn ActionCapability>) -> Self {
        Self {
            id: id.into(),
            action,
        }
    }
}

impl NodeExecutor for AgentNode {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let text = self.action.act(state).await?;
            debug!(node = %self.id, "Worker action complete");
            Ok(PartialResult::message(Message::agent(self.id.clone(), text)))
        })
    }
}

/// Route decider that surfaces the state's `next_hint`.
///
/// An unset hint yields an empty token, which the engine rejects and resolves
/// through the edge's fallback policy.
pub struct HintRouter;

impl RouteDecider for HintRouter {
    fn decide<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(state.next_hint().unwrap_or_default().to_string()) })
    }
}
