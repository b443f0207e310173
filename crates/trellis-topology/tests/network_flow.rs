//! End-to-end flows through the peer-to-peer mesh.

use std::sync::Arc;

use trellis_core::config::EngineConfig;
use trellis_core::error::TrellisError;
use trellis_core::event::RunEvent;
use trellis_core::message::{Author, Message};

use trellis_topology::{NetworkTopology, TopologyCatalog};

use trellis_test_utils::{entered_nodes, init_test_logging, ScriptedAction, StaticAction};

#[tokio::test]
async fn test_marker_routes_and_is_stripped_from_content() {
    init_test_logging();
    let topology = NetworkTopology::new()
        .add_agent(
            "network_chat",
            Arc::new(StaticAction::new(
                "this needs computation, over to the coder [ROUTE:network_coder]",
            )),
        )
        .add_agent("network_coder", Arc::new(StaticAction::new("computed: 42")));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("network", topology.build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("network", vec![Message::user("what is six times seven")])
        .await
        .unwrap();

    assert_eq!(entered_nodes(&mut events), vec!["network_chat", "network_coder"]);

    // Control syntax never reaches stored content.
    assert_eq!(
        messages[1].content,
        "this needs computation, over to the coder"
    );
    assert_eq!(messages[1].author, Author::agent("network_chat"));
    assert_eq!(messages[2].content, "computed: 42");
}

#[tokio::test]
async fn test_self_loop_allowed() {
    init_test_logging();
    let topology = NetworkTopology::new()
        .add_agent(
            "network_chat",
            Arc::new(ScriptedAction::new([
                "still thinking [ROUTE:network_chat]",
                "settled on an answer",
            ])),
        )
        .add_agent("network_coder", Arc::new(StaticAction::new("unused")));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("network", topology.build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("network", vec![Message::user("ponder this")])
        .await
        .unwrap();

    assert_eq!(entered_nodes(&mut events), vec!["network_chat", "network_chat"]);
    assert_eq!(messages.last().unwrap().content, "settled on an answer");
}

#[tokio::test]
async fn test_unknown_marker_target_ends_run() {
    init_test_logging();
    // A handoff to a peer that does not exist falls back to ending the run
    // instead of failing it.
    let topology = NetworkTopology::new()
        .add_agent(
            "network_chat",
            Arc::new(StaticAction::new("ask the oracle [ROUTE:network_psychic]")),
        )
        .add_agent("network_coder", Arc::new(StaticAction::new("unused")));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("network", topology.build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("network", vec![Message::user("hello")])
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);

    let mut nodes = Vec::new();
    let mut fallback_tokens = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            RunEvent::NodeEntered { node, .. } => nodes.push(node),
            RunEvent::RoutingFallback { token, .. } => fallback_tokens.push(token),
            _ => {}
        }
    }
    assert_eq!(nodes, vec!["network_chat"]);
    assert_eq!(fallback_tokens, vec!["network_psychic"]);
}

#[tokio::test]
async fn test_endless_handoff_hits_step_budget() {
    init_test_logging();
    let topology = NetworkTopology::new().add_agent(
        "network_chat",
        Arc::new(StaticAction::new("one more pass [ROUTE:network_chat]")),
    );
    let mut catalog = TopologyCatalog::with_config(EngineConfig {
        max_steps: 3,
        ..EngineConfig::default()
    });
    catalog.insert("network", topology.build().unwrap());

    let err = catalog
        .run("network", vec![Message::user("loop forever")])
        .await
        .unwrap_err();
    assert!(matches!(err.error, TrellisError::StepBudgetExceeded(3)));
    // Three passes committed before the abort.
    assert_eq!(err.partial.messages().len(), 4);
}
