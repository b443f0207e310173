//! Cooperative execution loop.
//!
//! One node executes at a time; the engine alternates between invoking the
//! current node's executor and resolving the next node from the edge table,
//! until the terminal sentinel or the step budget. State is exclusively
//! owned by the run; the compiled graph is shared read-only.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trellis_core::error::TrellisError;
use trellis_core::event::{EventBus, RunEvent};
use trellis_core::state::State;
use trellis_core::types::{RunId, Target};

use crate::builder::Graph;
use crate::edge::{normalize_token, Edge};

/// A failed run: the error plus the state accumulated before the failure.
///
/// The partial state is diagnostic context only, never a committed result.
#[derive(Debug, Error)]
#[error("Graph run aborted: {error}")]
pub struct RunError {
    pub error: TrellisError,
    pub partial: State,
}

/// Drives state through a compiled graph.
pub struct Engine {
    events: Arc<EventBus>,
}

impl Engine {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { events }
    }

    /// The event bus step events are published to.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run the graph to completion.
    ///
    /// `max_steps` bounds the number of node executions; exceeding it fails
    /// the run with `StepBudgetExceeded` rather than looping forever. Node
    /// failures abort fail-fast: none of the failing step's messages are
    /// committed.
    pub async fn run(
        &self,
        graph: &Graph,
        state: State,
        max_steps: usize,
    ) -> Result<State, RunError> {
        self.run_with_cancel(graph, state, max_steps, CancellationToken::new())
            .await
    }

    /// Like [`Engine::run`], with a caller-held token that can abort this
    /// run between steps.
    ///
    /// The token is scoped to this invocation: cancelling it never touches
    /// other runs, in flight or future, on the same engine. Cancellation is
    /// honored at the top of each iteration; a node already executing runs
    /// to completion.
    pub async fn run_with_cancel(
        &self,
        graph: &Graph,
        state: State,
        max_steps: usize,
        cancel: CancellationToken,
    ) -> Result<State, RunError> {
        let run_id = RunId::new();
        self.events.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
            entry: graph.entry().to_string(),
        });
        info!(run_id = %run_id, entry = graph.entry(), "Graph run started");

        let mut state = state;
        let mut current = Target::node(graph.entry());
        let mut steps = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(self.fail(&run_id, steps, TrellisError::Cancelled, state));
            }

            let node_id = match &current {
                Target::End => {
                    info!(run_id = %run_id, steps, "Graph run complete");
                    self.events.publish(RunEvent::RunCompleted {
                        run_id: run_id.clone(),
                        steps,
                    });
                    return Ok(state);
                }
                Target::Node { id } => id.clone(),
            };

            if steps >= max_steps {
                warn!(run_id = %run_id, steps, "Step budget exhausted, likely routing cycle");
                return Err(self.fail(&run_id, steps, TrellisError::StepBudgetExceeded(steps), state));
            }

            let Some(executor) = graph.node(&node_id) else {
                // Compiled graphs validate every routable id, so this is a
                // construction bug, not an oracle mistake.
                return Err(self.fail(&run_id, steps, TrellisError::UnknownNode(node_id), state));
            };

            self.events.publish(RunEvent::NodeEntered {
                run_id: run_id.clone(),
                node: node_id.clone(),
                step: steps,
            });
            debug!(run_id = %run_id, node = %node_id, step = steps, "Executing node");

            let partial = match executor.run(&state).await {
                Ok(partial) => partial,
                Err(e) => {
                    error!(run_id = %run_id, node = %node_id, error = %e, "Node execution failed");
                    let wrapped = TrellisError::node_execution(node_id, e);
                    return Err(self.fail(&run_id, steps, wrapped, state));
                }
            };

            for message in partial.messages {
                state.append(message);
            }
            if let Some(hint) = partial.next_hint {
                state.set_next_hint(hint);
            }

            let next = match graph.edge(&node_id) {
                None => {
                    debug!(run_id = %run_id, node = %node_id, "No outgoing edge, ending run");
                    Target::End
                }
                Some(Edge::Direct { to }) => Target::node(to.clone()),
                Some(Edge::Conditional(edge)) => {
                    let raw = match edge.decide.decide(&state).await {
                        Ok(token) => token,
                        Err(e) => return Err(self.fail(&run_id, steps, e, state)),
                    };
                    let token = normalize_token(&raw);
                    match edge.resolve_token(&token) {
                        Some(target) => target,
                        None => {
                            let origin = state
                                .last_message()
                                .map(|m| m.content.as_str())
                                .unwrap_or_default();
                            let target = edge.fallback.resolve(origin);
                            warn!(
                                run_id = %run_id,
                                node = %node_id,
                                token = %token,
                                target = %target,
                                "Decision token rejected, fallback applied"
                            );
                            self.events.publish(RunEvent::RoutingFallback {
                                run_id: run_id.clone(),
                                from: node_id.clone(),
                                token,
                                target: target.clone(),
                            });
                            target
                        }
                    }
                }
            };

            debug!(run_id = %run_id, from = %node_id, target = %next, "Route resolved");
            self.events.publish(RunEvent::RoutingDecision {
                run_id: run_id.clone(),
                from: node_id,
                target: next.clone(),
            });

            current = next;
            steps += 1;
        }
    }

    fn fail(&self, run_id: &RunId, steps: usize, error: TrellisError, partial: State) -> RunError {
        self.events.publish(RunEvent::RunFailed {
            run_id: run_id.clone(),
            steps,
            error: error.to_string(),
        });
        RunError { error, partial }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Arc::new(EventBus::default()))
    }
}
