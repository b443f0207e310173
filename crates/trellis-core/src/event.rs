use crate::types::{NodeId, RunId, Target};

/// Observability event emitted during a graph run.
///
/// Consumed by external logging/telemetry collaborators; the engine never
/// blocks on subscribers. `RoutingFallback` is a handled, expected condition,
/// not an error.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A run started at the graph's entry node.
    RunStarted { run_id: RunId, entry: NodeId },
    /// The engine is about to invoke a node.
    NodeEntered {
        run_id: RunId,
        node: NodeId,
        step: usize,
    },
    /// An outgoing route was resolved for a node.
    RoutingDecision {
        run_id: RunId,
        from: NodeId,
        target: Target,
    },
    /// The decision token was outside the allowed set and the fallback
    /// policy chose the target instead.
    RoutingFallback {
        run_id: RunId,
        from: NodeId,
        token: String,
        target: Target,
    },
    /// The run reached the terminal sentinel.
    RunCompleted { run_id: RunId, steps: usize },
    /// The run aborted with an error.
    RunFailed {
        run_id: RunId,
        steps: usize,
        error: String,
    },
}

/// Broadcast bus for run events.
/// Every subscriber sees every event; the engine never waits on consumers.
pub struct EventBus {
    tx: tokio::sync::broadcast::Sender<RunEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: RunEvent) {
        // No subscribers is fine, drop the event
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
