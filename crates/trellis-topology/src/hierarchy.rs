//! Three-tier tree: root supervisor, team supervisors, workers.
//!
//! The root delegates a request to one team; the team delegates to one of its
//! workers; the worker reports to its team; the team reports to the root; the
//! root ends the run. Team nodes have two behaviors keyed on who invoked
//! them, read off the most recent message's author tag.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_core::message::Message;
use trellis_core::state::{PartialResult, State};
use trellis_core::traits::{ActionCapability, DecisionCapability};
use trellis_core::types::{NodeId, Target, FINISH};

use trellis_graph::{normalize_token, ConditionalEdge, FallbackPolicy, Graph, GraphBuilder, NodeExecutor};

use crate::node::{AgentNode, HintRouter};

/// One mid-tier team: a supervisor with its own decision capability and a
/// fixed set of workers.
pub struct TeamSpec {
    id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    workers: Vec<(NodeId, Arc<dyn ActionCapability>)>,
    default_worker: Option<NodeId>,
}

impl TeamSpec {
    pub fn new(id: impl Into<NodeId>, decision: Arc<dyn DecisionCapability>) -> Self {
        Self {
            id: id.into(),
            decision,
            workers: Vec::new(),
            default_worker: None,
        }
    }

    pub fn add_worker(mut self, id: impl Into<NodeId>, action: Arc<dyn ActionCapability>) -> Self {
        self.workers.push((id.into(), action));
        self
    }

    /// Worker chosen when the team's oracle answers outside the member set
    /// (default: the first worker added).
    pub fn with_default_worker(mut self, id: impl Into<NodeId>) -> Self {
        self.default_worker = Some(id.into());
        self
    }
}

/// Builder for the hierarchical (three-tier) topology.
pub struct HierarchicalTopology {
    root_id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    teams: Vec<TeamSpec>,
    default_team: Option<NodeId>,
}

impl HierarchicalTopology {
    pub fn new(decision: Arc<dyn DecisionCapability>) -> Self {
        Self {
            root_id: "root".into(),
            decision,
            teams: Vec::new(),
            default_team: None,
        }
    }

    /// Rename the root node (default `root`).
    pub fn with_root_id(mut self, id: impl Into<NodeId>) -> Self {
        self.root_id = id.into();
        self
    }

    pub fn add_team(mut self, team: TeamSpec) -> Self {
        self.teams.push(team);
        self
    }

    /// Team chosen when the root's oracle answers outside the team set
    /// (default: the first team added).
    pub fn with_default_team(mut self, id: impl Into<NodeId>) -> Self {
        self.default_team = Some(id.into());
        self
    }

    /// Compile the tree into an executable graph.
    pub fn build(self) -> Result<Graph> {
        if self.teams.is_empty() {
            return Err(TrellisError::Config(
                "hierarchical topology needs at least one team".into(),
            ));
        }
        for team in &self.teams {
            if team.workers.is_empty() {
                return Err(TrellisError::Config(format!(
                    "team '{}' needs at least one worker",
                    team.id
                )));
            }
        }

        let team_ids: Vec<NodeId> = self.teams.iter().map(|t| t.id.clone()).collect();
        let default_team = self.default_team.unwrap_or_else(|| team_ids[0].clone());

        let mut root_targets: Vec<Target> = team_ids.iter().cloned().map(Target::node).collect();
        root_targets.push(Target::End);

        let root = RootNode {
            id: self.root_id.clone(),
            decision: self.decision,
            teams: team_ids,
            default_team: default_team.clone(),
            targets: root_targets.clone(),
        };

        let mut builder = GraphBuilder::new();
        builder.add_node(self.root_id.clone(), Arc::new(root))?;
        builder.add_conditional_edge(
            self.root_id.clone(),
            ConditionalEdge::new(
                Arc::new(HintRouter),
                root_targets,
                FallbackPolicy::new(Target::node(default_team)),
            ),
        )?;

        for team in self.teams {
            let worker_ids: Vec<NodeId> = team.workers.iter().map(|(id, _)| id.clone()).collect();
            let default_worker = team
                .default_worker
                .clone()
                .unwrap_or_else(|| worker_ids[0].clone());
            let worker_targets: Vec<Target> =
                worker_ids.iter().cloned().map(Target::node).collect();

            let node = TeamNode {
                id: team.id.clone(),
                root_id: self.root_id.clone(),
                decision: team.decision,
                workers: worker_ids,
                default_worker,
                targets: worker_targets.clone(),
            };
            builder.add_node(team.id.clone(), Arc::new(node))?;

            let mut team_targets = worker_targets;
            team_targets.push(Target::node(self.root_id.clone()));
            builder.add_conditional_edge(
                team.id.clone(),
                ConditionalEdge::new(
                    Arc::new(HintRouter),
                    team_targets,
                    FallbackPolicy::new(Target::node(self.root_id.clone())),
                ),
            )?;

            for (worker_id, action) in team.workers {
                builder.add_node(
                    worker_id.clone(),
                    Arc::new(AgentNode::new(worker_id.clone(), action)),
                )?;
                builder.add_edge(worker_id, team.id.clone())?;
            }
        }

        builder.compile(self.root_id)
    }
}

/// Top-level supervisor: delegates fresh requests, ends the run on reports.
struct RootNode {
    id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    teams: Vec<NodeId>,
    default_team: NodeId,
    targets: Vec<Target>,
}

impl NodeExecutor for RootNode {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let team_report = state
                .last_message()
                .and_then(|m| m.author.agent_id())
                .map(|id| self.teams.iter().any(|t| t == id))
                .unwrap_or(false);

            if team_report {
                debug!(root = %self.id, "Team reported, ending run");
                return Ok(PartialResult::none().with_hint(FINISH));
            }

            let request = state
                .last_message()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let token = self.decision.decide(state, &self.targets).await?;
            let normalized = normalize_token(&token);
            let team = self
                .teams
                .iter()
                .find(|t| t.eq_ignore_ascii_case(&normalized))
                .cloned()
                .unwrap_or_else(|| self.default_team.clone());
            debug!(root = %self.id, team = %team, "Delegating request");

            Ok(PartialResult::message(Message::agent(
                self.id.clone(),
                format!("delegating to {team}: {request}"),
            ))
            .with_hint(team))
        })
    }
}

/// Mid-tier supervisor: assigns work when called by the root, reports up when
/// called by a worker. An empty or ambiguous history counts as a worker
/// report.
struct TeamNode {
    id: NodeId,
    root_id: NodeId,
    decision: Arc<dyn DecisionCapability>,
    workers: Vec<NodeId>,
    default_worker: NodeId,
    targets: Vec<Target>,
}

impl NodeExecutor for TeamNode {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let from_root = state
                .last_message()
                .and_then(|m| m.author.agent_id())
                .map(|id| id == self.root_id)
                .unwrap_or(false);

            if !from_root {
                debug!(team = %self.id, "Worker reported, escalating to root");
                return Ok(PartialResult::message(Message::agent(
                    self.id.clone(),
                    "team task complete",
                ))
                .with_hint(self.root_id.clone()));
            }

            let token = self.decision.decide(state, &self.targets).await?;
            let normalized = normalize_token(&token);
            let worker = self
                .workers
                .iter()
                .find(|w| w.eq_ignore_ascii_case(&normalized))
                .cloned()
                .unwrap_or_else(|| self.default_worker.clone());
            debug!(team = %self.id, worker = %worker, "Assigning task");

            Ok(PartialResult::message(Message::agent(
                self.id.clone(),
                format!("task accepted, assigning to {worker}"),
            ))
            .with_hint(worker))
        })
    }
}
