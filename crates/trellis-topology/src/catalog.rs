use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use trellis_core::config::EngineConfig;
use trellis_core::error::TrellisError;
use trellis_core::event::{EventBus, RunEvent};
use trellis_core::message::Message;
use trellis_core::state::State;

use trellis_graph::{Engine, Graph, RunError};

/// Compiled graphs by id, sharing one engine and event bus.
///
/// The process-level entry point: register each topology once at startup,
/// then `run` any of them concurrently. Graphs are read-only and every run
/// gets its own state.
pub struct TopologyCatalog {
    graphs: HashMap<String, Arc<Graph>>,
    engine: Engine,
    config: EngineConfig,
}

impl TopologyCatalog {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let events = Arc::new(EventBus::new(config.event_capacity));
        Self {
            graphs: HashMap::new(),
            engine: Engine::new(events),
            config,
        }
    }

    /// Register a compiled graph under an id. Replaces any previous graph
    /// with the same id.
    pub fn insert(&mut self, id: impl Into<String>, graph: Graph) -> &mut Self {
        let id = id.into();
        info!(graph_id = %id, nodes = graph.node_count(), "Registering graph");
        self.graphs.insert(id, Arc::new(graph));
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.graphs.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Subscribe to run events across all graphs in this catalog.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.engine.events().subscribe()
    }

    /// Run a registered graph over the given conversation.
    ///
    /// Returns the full message log, initial messages included, in append
    /// order.
    pub async fn run(
        &self,
        graph_id: &str,
        initial: Vec<Message>,
    ) -> Result<Vec<Message>, RunError> {
        self.run_with_cancel(graph_id, initial, CancellationToken::new())
            .await
    }

    /// Like [`TopologyCatalog::run`], with a caller-held token that can
    /// abort this run between steps. Cancellation is scoped to this
    /// invocation; other runs on the catalog are unaffected.
    pub async fn run_with_cancel(
        &self,
        graph_id: &str,
        initial: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Vec<Message>, RunError> {
        let Some(graph) = self.graphs.get(graph_id) else {
            return Err(RunError {
                error: TrellisError::UnknownGraph(graph_id.to_string()),
                partial: State::new(),
            });
        };
        let state = State::from_messages(initial);
        let final_state = self
            .engine
            .run_with_cancel(graph, state, self.config.max_steps, cancel)
            .await?;
        Ok(final_state.into_messages())
    }
}

impl Default for TopologyCatalog {
    fn default() -> Self {
        Self::new()
    }
}
