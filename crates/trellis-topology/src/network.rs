//! Mesh topology: every agent may hand off to any agent, itself included.
//!
//! There is no routing oracle here. Each agent's action embeds its handoff
//! as a `[ROUTE:target]` marker in its own output; the node strips every
//! marker before the message reaches the state and surfaces the first one as
//! the routing hint, so stored content never carries control syntax.

use std::sync::Arc;
use std::sync::OnceLock;

use futures::future::BoxFuture;
use regex::Regex;
use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_core::message::Message;
use trellis_core::state::{PartialResult, State};
use trellis_core::traits::ActionCapability;
use trellis_core::types::{NodeId, Target, FINISH};

use trellis_graph::{ConditionalEdge, FallbackPolicy, Graph, GraphBuilder, NodeExecutor};

use crate::node::HintRouter;

fn route_marker() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| Regex::new(r"\[ROUTE:([A-Za-z0-9_-]+)\]").expect("route marker pattern"))
}

/// Split an action output into cleaned content and the first routing marker.
///
/// Every marker is removed from the content; only the first one routes.
pub fn strip_route_markers(text: &str) -> (String, Option<String>) {
    let marker = route_marker();
    let route = marker
        .captures(text)
        .map(|caps| caps[1].to_string());
    let cleaned = marker.replace_all(text, "").trim().to_string();
    (cleaned, route)
}

/// Builder for the network (mesh) topology.
pub struct NetworkTopology {
    agents: Vec<(NodeId, Arc<dyn ActionCapability>)>,
    entry: Option<NodeId>,
}

impl Default for NetworkTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTopology {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            entry: None,
        }
    }

    pub fn add_agent(mut self, id: impl Into<NodeId>, action: Arc<dyn ActionCapability>) -> Self {
        self.agents.push((id.into(), action));
        self
    }

    /// Entry agent (default: the first agent added).
    pub fn with_entry(mut self, id: impl Into<NodeId>) -> Self {
        self.entry = Some(id.into());
        self
    }

    /// Compile the mesh into an executable graph.
    pub fn build(self) -> Result<Graph> {
        if self.agents.is_empty() {
            return Err(TrellisError::Config(
                "network topology needs at least one agent".into(),
            ));
        }
        let entry = self
            .entry
            .unwrap_or_else(|| self.agents[0].0.clone());

        // Full mesh: every agent may route to every agent or end the run.
        let mut targets: Vec<Target> = self
            .agents
            .iter()
            .map(|(id, _)| Target::node(id.clone()))
            .collect();
        targets.push(Target::End);

        let mut builder = GraphBuilder::new();
        for (id, action) in self.agents {
            builder.add_node(id.clone(), Arc::new(NetworkNode { id: id.clone(), action }))?;
            builder.add_conditional_edge(
                id,
                ConditionalEdge::new(
                    Arc::new(HintRouter),
                    targets.clone(),
                    FallbackPolicy::new(Target::End),
                ),
            )?;
        }
        builder.compile(entry)
    }
}

/// A mesh agent: runs its action, strips routing markers from the output,
/// and turns the first marker into the routing hint. No marker ends the run.
struct NetworkNode {
    id: NodeId,
    action: Arc<dyn ActionCapability>,
}

impl NodeExecutor for NetworkNode {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let text = self.action.act(state).await?;
            let (content, route) = strip_route_markers(&text);
            let hint = route.unwrap_or_else(|| FINISH.to_string());
            debug!(node = %self.id, hint = %hint, "Network agent handing off");
            Ok(PartialResult::message(Message::agent(self.id.clone(), content)).with_hint(hint))
        })
    }
}
