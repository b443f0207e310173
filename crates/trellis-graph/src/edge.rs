use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;

use trellis_core::error::Result;
use trellis_core::state::State;
use trellis_core::types::{NodeId, Target};

use crate::fallback::FallbackPolicy;

/// Decides the next node for a conditional edge.
///
/// Returns a raw routing token; the engine normalizes it and checks it
/// against the edge's allowed targets, applying the fallback policy when it
/// falls outside. An `Err` aborts the run.
pub trait RouteDecider: Send + Sync + 'static {
    fn decide<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<String>>;
}

impl std::fmt::Debug for dyn RouteDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<dyn RouteDecider>")
    }
}

impl<F> RouteDecider for F
where
    F: for<'a> Fn(&'a State) -> BoxFuture<'a, Result<String>> + Send + Sync + 'static,
{
    fn decide<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<String>> {
        self(state)
    }
}

/// Outgoing transition rule for a node. Each node has at most one.
#[derive(Debug)]
pub enum Edge {
    /// Always route to `to`.
    Direct { to: NodeId },
    /// Route where the decider points, within a declared target set.
    Conditional(ConditionalEdge),
}

impl Edge {
    pub fn direct(to: impl Into<NodeId>) -> Self {
        Self::Direct { to: to.into() }
    }
}

/// A decision-driven edge: the decider proposes, the allowed set disposes.
#[derive(Debug)]
pub struct ConditionalEdge {
    pub allowed: HashSet<Target>,
    pub decide: Arc<dyn RouteDecider>,
    pub fallback: FallbackPolicy,
}

impl ConditionalEdge {
    pub fn new(
        decide: Arc<dyn RouteDecider>,
        allowed: impl IntoIterator<Item = Target>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            decide,
            fallback,
        }
    }

    /// Resolve a normalized token against the allowed set.
    pub fn resolve_token(&self, token: &str) -> Option<Target> {
        if token.is_empty() {
            return None;
        }
        self.allowed.iter().find(|t| t.matches_token(token)).cloned()
    }
}

/// Normalize a raw decision token: trim whitespace, fold case.
///
/// The decision capability is an untrusted oracle; tokens like `" Coder.\n"`
/// still have to route.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == ':')
        .to_ascii_lowercase()
}
