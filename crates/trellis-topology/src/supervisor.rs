//! Star topology: one supervisor hub, N workers.
//!
//! The hub owns all routing. On a fresh user turn it asks the decision
//! capability to pick a worker for the request; on a worker report it asks
//! whether the conversation is adequate, defaulting to ending the run. Every
//! worker reports back to the hub unconditionally.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_core::message::Message;
use trellis_core::state::{PartialResult, State};
use trellis_core::traits::{ActionCapability, DecisionCapability};
use trellis_core::types::{NodeId, Target, FINISH};

use trellis_graph::{
    normalize_token, ConditionalEdge, FallbackPolicy, Graph, GraphBuilder, NodeExecutor,
};

use crate::node::{AgentNode, HintRouter};

/// One worker in a supervisor star.
pub struct WorkerSpec {
    id: NodeId,
    action: Arc<dyn ActionCapability>,
    keywords: Vec<String>,
}

impl WorkerSpec {
    pub fn new(id: impl Into<NodeId>, action: Arc<dyn ActionCapability>) -> Self {
        Self {
            id: id.into(),
            action,
            keywords: Vec::new(),
        }
    }

    /// Keywords that route a request to this worker when the decision oracle
    /// answers outside the allowed set. Declaration order across workers is
    /// rule priority order.
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// Builder for the supervisor (star) topology.
pub struct SupervisorTopology {
    hub_id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    workers: Vec<WorkerSpec>,
    default_worker: Option<NodeId>,
}

impl SupervisorTopology {
    pub fn new(decision: Arc<dyn DecisionCapability>) -> Self {
        Self {
            hub_id: "supervisor".into(),
            decision,
            workers: Vec::new(),
            default_worker: None,
        }
    }

    /// Rename the hub node (default `supervisor`).
    pub fn with_hub_id(mut self, id: impl Into<NodeId>) -> Self {
        self.hub_id = id.into();
        self
    }

    pub fn add_worker(mut self, worker: WorkerSpec) -> Self {
        self.workers.push(worker);
        self
    }

    /// Worker that takes requests no keyword rule claims (default: the first
    /// worker added).
    pub fn with_default_worker(mut self, id: impl Into<NodeId>) -> Self {
        self.default_worker = Some(id.into());
        self
    }

    /// Compile the star into an executable graph.
    pub fn build(self) -> Result<Graph> {
        if self.workers.is_empty() {
            return Err(TrellisError::Config(
                "supervisor topology needs at least one worker".into(),
            ));
        }
        let worker_ids: Vec<NodeId> = self.workers.iter().map(|w| w.id.clone()).collect();
        let default_worker = self
            .default_worker
            .unwrap_or_else(|| worker_ids[0].clone());

        let worker_targets: Vec<Target> = worker_ids.iter().cloned().map(Target::node).collect();
        let mut targets = worker_targets.clone();
        targets.push(Target::End);

        let mut fallback = FallbackPolicy::new(Target::node(default_worker));
        for worker in &self.workers {
            if !worker.keywords.is_empty() {
                fallback = fallback.with_rule(Target::node(worker.id.clone()), worker.keywords.clone());
            }
        }

        let hub = HubNode {
            id: self.hub_id.clone(),
            decision: self.decision,
            workers: worker_ids,
            worker_targets,
            targets: targets.clone(),
        };

        let mut builder = GraphBuilder::new();
        builder.add_node(self.hub_id.clone(), Arc::new(hub))?;
        for worker in &self.workers {
            builder.add_node(
                worker.id.clone(),
                Arc::new(AgentNode::new(worker.id.clone(), worker.action.clone())),
            )?;
            builder.add_edge(worker.id.clone(), self.hub_id.clone())?;
        }
        builder.add_conditional_edge(
            self.hub_id.clone(),
            ConditionalEdge::new(Arc::new(HintRouter), targets, fallback),
        )?;
        builder.compile(self.hub_id)
    }
}

/// The hub: inspects the last author to pick a routing mode.
struct HubNode {
    id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    workers: Vec<NodeId>,
    /// Workers only; what a fresh user turn may route to.
    worker_targets: Vec<Target>,
    /// Workers plus the terminal sentinel; what a worker report may route to.
    targets: Vec<Target>,
}

impl HubNode {
    fn is_worker_report(&self, state: &State) -> bool {
        state
            .last_message()
            .and_then(|m| m.author.agent_id())
            .map(|id| self.workers.iter().any(|w| w == id))
            .unwrap_or(false)
    }
}

impl NodeExecutor for HubNode {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            if state.messages().is_empty() {
                // Nothing to route on yet; hand the turn to the default path
                // via the edge fallback.
                return Ok(PartialResult::none());
            }

            if !self.is_worker_report(state) {
                // Fresh user turn: the oracle picks among the workers; the
                // terminal sentinel is reserved for worker reports. An answer
                // outside the member set flows through the edge's keyword
                // fallback against the request itself.
                let token = self.decision.decide(state, &self.worker_targets).await?;
                let normalized = normalize_token(&token);
                let hint = match self
                    .workers
                    .iter()
                    .find(|w| w.eq_ignore_ascii_case(&normalized))
                {
                    Some(worker) => worker.clone(),
                    // A terminal answer must not end the run before any
                    // worker ran; clearing it leaves the edge fallback to
                    // route the request.
                    None if Target::End.matches_token(&normalized) => String::new(),
                    None => token,
                };
                debug!(hub = %self.id, token = %normalized, "Routing fresh turn");
                return Ok(PartialResult::none().with_hint(hint));
            }

            // Worker report: ask whether the conversation is adequate. Any
            // answer outside the member set ends the run.
            let token = self.decision.decide(state, &self.targets).await?;
            let normalized = normalize_token(&token);
            let resolved = self
                .targets
                .iter()
                .find(|t| t.matches_token(&normalized))
                .cloned()
                .unwrap_or(Target::End);
            debug!(hub = %self.id, token = %token, target = %resolved, "Reviewing worker report");

            match resolved {
                Target::Node { id } => Ok(PartialResult::none().with_hint(id)),
                Target::End => Ok(PartialResult::message(Message::agent(
                    self.id.clone(),
                    "request handled, closing the conversation",
                ))
                .with_hint(FINISH)),
            }
        })
    }
}
