//! Capability stubs for testing graph topologies without a live model.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;

use trellis_core::error::{Result, TrellisError};
use trellis_core::event::RunEvent;
use trellis_core::state::State;
use trellis_core::traits::{ActionCapability, DecisionCapability};
use trellis_core::types::{Target, FINISH};

/// Decision stub that replays a fixed script of tokens, one per call.
/// Returns `FINISH` once the script is exhausted.
pub struct ScriptedDecision {
    tokens: Mutex<VecDeque<String>>,
}

impl ScriptedDecision {
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: Mutex::new(tokens.into_iter().map(Into::into).collect()),
        }
    }
}

impl DecisionCapability for ScriptedDecision {
    fn decide<'a>(
        &'a self,
        _state: &'a State,
        _allowed: &'a [Target],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let token = self
                .tokens
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| FINISH.to_string());
            Ok(token)
        })
    }
}

/// Decision stub that always answers the same token.
pub struct FixedDecision(pub String);

impl FixedDecision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl DecisionCapability for FixedDecision {
    fn decide<'a>(
        &'a self,
        _state: &'a State,
        _allowed: &'a [Target],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Decision stub that fails every call.
pub struct BrokenDecision;

impl DecisionCapability for BrokenDecision {
    fn decide<'a>(
        &'a self,
        _state: &'a State,
        _allowed: &'a [Target],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Err(TrellisError::Decision("stub oracle offline".into())) })
    }
}

/// Action stub that always produces the same text.
pub struct StaticAction(pub String);

impl StaticAction {
    pub fn new(reply: impl Into<String>) -> Self {
        Self(reply.into())
    }
}

impl ActionCapability for StaticAction {
    fn act<'a>(&'a self, _state: &'a State) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Action stub that replays a script of replies, one per call.
/// Repeats the last reply once the script is exhausted.
pub struct ScriptedAction {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedAction {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
        }
    }
}

impl ActionCapability for ScriptedAction {
    fn act<'a>(&'a self, _state: &'a State) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let next = self.replies.lock().expect("script lock").pop_front();
            let mut last = self.last.lock().expect("script lock");
            if let Some(reply) = next {
                *last = reply.clone();
                Ok(reply)
            } else {
                Ok(last.clone())
            }
        })
    }
}

/// Action stub that echoes the most recent message content.
pub struct EchoAction;

impl ActionCapability for EchoAction {
    fn act<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            Ok(state
                .last_message()
                .map(|m| m.content.clone())
                .unwrap_or_default())
        })
    }
}

/// Action stub that fails every call.
pub struct BrokenAction;

impl ActionCapability for BrokenAction {
    fn act<'a>(&'a self, _state: &'a State) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Err(TrellisError::Action("stub tool offline".into())) })
    }
}

/// Drain buffered run events, returning the ids of nodes entered in order.
pub fn entered_nodes(rx: &mut tokio::sync::broadcast::Receiver<RunEvent>) -> Vec<String> {
    let mut nodes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::NodeEntered { node, .. } = event {
            nodes.push(node);
        }
    }
    nodes
}

/// Install a compact tracing subscriber honoring `RUST_LOG`.
/// Safe to call from multiple tests; only the first call wins.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::message::Message;

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        futures::executor::block_on(fut)
    }

    #[test]
    fn test_scripted_decision_replays_then_finishes() {
        let decision = ScriptedDecision::new(["coder", "searcher"]);
        let state = State::new();
        assert_eq!(block_on(decision.decide(&state, &[])).unwrap(), "coder");
        assert_eq!(block_on(decision.decide(&state, &[])).unwrap(), "searcher");
        assert_eq!(block_on(decision.decide(&state, &[])).unwrap(), FINISH);
    }

    #[test]
    fn test_scripted_action_repeats_last_reply() {
        let action = ScriptedAction::new(["one", "two"]);
        let state = State::new();
        assert_eq!(block_on(action.act(&state)).unwrap(), "one");
        assert_eq!(block_on(action.act(&state)).unwrap(), "two");
        assert_eq!(block_on(action.act(&state)).unwrap(), "two");
    }

    #[test]
    fn test_echo_action() {
        let state = State::from_messages(vec![Message::user("bounce")]);
        assert_eq!(block_on(EchoAction.act(&state)).unwrap(), "bounce");
    }
}
