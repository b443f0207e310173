use std::collections::HashMap;
use std::sync::Arc;

use trellis_core::error::{Result, TrellisError};
use trellis_core::types::NodeId;

use crate::node::NodeExecutor;

/// Name-to-executor map built up during graph construction.
///
/// Mutable only before compilation; `GraphBuilder::compile` consumes it, so
/// no registration can happen once a graph exists.
#[derive(Default, Debug)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, Arc<dyn NodeExecutor>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under a unique id.
    pub fn register(&mut self, id: impl Into<NodeId>, executor: Arc<dyn NodeExecutor>) -> Result<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(TrellisError::DuplicateNode(id));
        }
        self.nodes.insert(id, executor);
        Ok(())
    }

    /// Look up an executor by id.
    pub fn get(&self, id: &str) -> Result<&Arc<dyn NodeExecutor>> {
        self.nodes
            .get(id)
            .ok_or_else(|| TrellisError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_inner(self) -> HashMap<NodeId, Arc<dyn NodeExecutor>> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use trellis_core::error::Result;
    use trellis_core::state::{PartialResult, State};

    fn noop(_state: &State) -> BoxFuture<'_, Result<PartialResult>> {
        Box::pin(async { Ok(PartialResult::none()) })
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = NodeRegistry::new();
        registry.register("chat", Arc::new(noop)).unwrap();
        let err = registry.register("chat", Arc::new(noop)).unwrap_err();
        assert!(matches!(err, TrellisError::DuplicateNode(id) if id == "chat"));
    }

    #[test]
    fn test_get_unknown_node() {
        let registry = NodeRegistry::new();
        let err = registry.get("ghost").unwrap_err();
        assert!(matches!(err, TrellisError::UnknownNode(id) if id == "ghost"));
    }

    #[test]
    fn test_get_registered_node() {
        let mut registry = NodeRegistry::new();
        registry.register("coder", Arc::new(noop)).unwrap();
        assert!(registry.get("coder").is_ok());
        assert!(registry.contains("coder"));
        assert_eq!(registry.len(), 1);
    }
}
