use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use trellis_core::error::{Result, ValidationRule};
use trellis_core::types::{NodeId, Target};

use crate::edge::{ConditionalEdge, Edge};
use crate::node::NodeExecutor;
use crate::registry::NodeRegistry;

/// Collects nodes and edges, then validates them into an immutable [`Graph`].
///
/// `compile` consumes the builder; there is no way to mutate a graph after
/// compilation.
#[derive(Default, Debug)]
pub struct GraphBuilder {
    registry: NodeRegistry,
    edges: HashMap<NodeId, Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Ids must be unique within the graph.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        executor: Arc<dyn NodeExecutor>,
    ) -> Result<&mut Self> {
        self.registry.register(id, executor)?;
        Ok(self)
    }

    /// Add an unconditional edge. Each node may have at most one outgoing edge.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Result<&mut Self> {
        self.insert_edge(from.into(), Edge::direct(to))
    }

    /// Add a decision-driven edge. Each node may have at most one outgoing edge.
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<NodeId>,
        edge: ConditionalEdge,
    ) -> Result<&mut Self> {
        self.insert_edge(from.into(), Edge::Conditional(edge))
    }

    fn insert_edge(&mut self, from: NodeId, edge: Edge) -> Result<&mut Self> {
        if self.edges.contains_key(&from) {
            return Err(ValidationRule::DuplicateEdge(from).into());
        }
        self.edges.insert(from, edge);
        Ok(self)
    }

    /// Validate the registry and edge table and freeze them into a [`Graph`].
    ///
    /// Checks, in order: the entry node exists; every edge source exists;
    /// every edge target (direct, allowed, fallback) stays inside the graph;
    /// every node is reachable from the entry when a conditional edge is
    /// treated as the set of its allowed node targets.
    pub fn compile(self, entry: impl Into<NodeId>) -> Result<Graph> {
        let entry = entry.into();

        if !self.registry.contains(&entry) {
            return Err(ValidationRule::EntryNotRegistered(entry).into());
        }

        let mut froms: Vec<&NodeId> = self.edges.keys().collect();
        froms.sort();
        for from in froms {
            if !self.registry.contains(from) {
                return Err(ValidationRule::EdgeSourceUnknown(from.clone()).into());
            }
            match &self.edges[from] {
                Edge::Direct { to } => {
                    if !self.registry.contains(to) {
                        return Err(ValidationRule::EdgeTargetUnknown {
                            from: from.to_string(),
                            to: to.clone(),
                        }
                        .into());
                    }
                }
                Edge::Conditional(edge) => self.check_conditional(from, edge)?,
            }
        }

        self.check_reachability(&entry)?;

        debug!(
            entry = %entry,
            nodes = self.registry.len(),
            edges = self.edges.len(),
            "Graph compiled"
        );
        Ok(Graph {
            nodes: self.registry.into_inner(),
            edges: self.edges,
            entry,
        })
    }

    fn check_conditional(&self, from: &str, edge: &ConditionalEdge) -> Result<()> {
        let mut allowed_ids: Vec<&Target> = edge.allowed.iter().collect();
        allowed_ids.sort_by_key(|t| t.to_string());
        for target in allowed_ids {
            if let Some(id) = target.node_id() {
                if !self.registry.contains(id) {
                    return Err(ValidationRule::TargetOutsideGraph {
                        from: from.to_string(),
                        target: id.to_string(),
                    }
                    .into());
                }
            }
        }

        let mut fallback_targets = vec![edge.fallback.default_target()];
        fallback_targets.extend(edge.fallback.rules().iter().map(|r| &r.target));
        for target in fallback_targets {
            if !edge.allowed.contains(target) {
                return Err(ValidationRule::FallbackOutsideAllowed {
                    from: from.to_string(),
                    target: target.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_reachability(&self, entry: &str) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        seen.insert(entry);
        queue.push_back(entry);

        while let Some(id) = queue.pop_front() {
            let Some(edge) = self.edges.get(id) else {
                continue;
            };
            match edge {
                Edge::Direct { to } => {
                    if seen.insert(to) {
                        queue.push_back(to);
                    }
                }
                Edge::Conditional(cond) => {
                    for target in &cond.allowed {
                        if let Some(to) = target.node_id() {
                            if seen.insert(to) {
                                queue.push_back(to);
                            }
                        }
                    }
                }
            }
        }

        let mut unreached: Vec<&str> = self.registry.ids().filter(|id| !seen.contains(id)).collect();
        unreached.sort_unstable();
        if let Some(first) = unreached.first() {
            return Err(ValidationRule::Unreachable(first.to_string()).into());
        }
        Ok(())
    }
}

/// A compiled, immutable graph.
///
/// Read-only after construction, so one graph can back any number of
/// concurrent runs.
pub struct Graph {
    nodes: HashMap<NodeId, Arc<dyn NodeExecutor>>,
    edges: HashMap<NodeId, Edge>,
    entry: NodeId,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges.keys().collect::<Vec<_>>())
            .field("entry", &self.entry)
            .finish()
    }
}

impl Graph {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn NodeExecutor>> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
