//! End-to-end flows through the supervisor star.

use std::sync::Arc;

use trellis_core::config::EngineConfig;
use trellis_core::error::TrellisError;
use trellis_core::event::RunEvent;
use trellis_core::message::{Author, Message};

use trellis_topology::{SupervisorTopology, TopologyCatalog, WorkerSpec};

use trellis_test_utils::{
    entered_nodes, init_test_logging, FixedDecision, ScriptedDecision, StaticAction,
};

fn star(decision: Arc<dyn trellis_core::traits::DecisionCapability>) -> SupervisorTopology {
    SupervisorTopology::new(decision)
        .with_hub_id("hub")
        .add_worker(WorkerSpec::new("chat", Arc::new(StaticAction::new("happy to help"))))
        .add_worker(
            WorkerSpec::new("coder", Arc::new(StaticAction::new("ran the script, got 4")))
                .with_keywords(["code", "python", "calculate"]),
        )
        .add_worker(
            WorkerSpec::new("searcher", Arc::new(StaticAction::new("top result: rust 1.75")))
                .with_keywords(["search", "latest", "news"]),
        )
        .with_default_worker("chat")
}

#[tokio::test]
async fn test_hub_routes_to_coder_then_finishes() {
    init_test_logging();
    let decision = Arc::new(ScriptedDecision::new(["coder", "FINISH"]));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("supervisor", star(decision).build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("supervisor", vec![Message::user("calculate 2 + 2")])
        .await
        .unwrap();

    assert_eq!(entered_nodes(&mut events), vec!["hub", "coder", "hub"]);

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].author, Author::User);
    assert_eq!(messages[1].author, Author::agent("coder"));
    assert_eq!(messages[1].content, "ran the script, got 4");
    assert_eq!(messages[2].author, Author::agent("hub"));

    let seqs: Vec<u64> = messages.iter().map(|m| m.sequence()).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_invalid_oracle_token_uses_keyword_fallback() {
    init_test_logging();
    // The oracle never answers a member name; routing survives on keywords.
    let decision = Arc::new(FixedDecision::new("hmm, not sure"));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("supervisor", star(decision).build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("supervisor", vec![Message::user("search for the latest rust news")])
        .await
        .unwrap();

    // Fresh turn fell back to the searcher; the worker report then fell back
    // to FINISH inside the hub.
    assert_eq!(messages[1].author, Author::agent("searcher"));

    let mut fallback_tokens = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let RunEvent::RoutingFallback { token, .. } = event {
            fallback_tokens.push(token);
        }
    }
    assert_eq!(fallback_tokens, vec!["hmm, not sure"]);
}

#[tokio::test]
async fn test_plain_request_lands_on_default_worker() {
    init_test_logging();
    let decision = Arc::new(FixedDecision::new("no idea"));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("supervisor", star(decision).build().unwrap());

    let messages = catalog
        .run("supervisor", vec![Message::user("tell me a story")])
        .await
        .unwrap();

    assert_eq!(messages[1].author, Author::agent("chat"));
}

#[tokio::test]
async fn test_fresh_turn_finish_never_skips_workers() {
    init_test_logging();
    // A terminal answer on the opening turn is an oracle mistake; the
    // request still reaches a worker before the hub may close the run.
    let decision = Arc::new(ScriptedDecision::new(["FINISH", "FINISH"]));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("supervisor", star(decision).build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("supervisor", vec![Message::user("tell me a story")])
        .await
        .unwrap();

    assert_eq!(entered_nodes(&mut events), vec!["hub", "chat", "hub"]);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].author, Author::agent("chat"));
}

#[tokio::test]
async fn test_cancelled_run_does_not_poison_catalog() {
    init_test_logging();
    let decision = Arc::new(ScriptedDecision::new(["coder", "FINISH"]));
    let mut catalog = TopologyCatalog::new();
    catalog.insert("supervisor", star(decision).build().unwrap());

    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let err = catalog
        .run_with_cancel("supervisor", vec![Message::user("hi")], cancel)
        .await
        .unwrap_err();
    assert!(matches!(err.error, TrellisError::Cancelled));

    // Cancellation was scoped to that run; the next one completes.
    let messages = catalog
        .run("supervisor", vec![Message::user("calculate 2 + 2")])
        .await
        .unwrap();
    assert_eq!(messages[1].author, Author::agent("coder"));
}

#[tokio::test]
async fn test_oracle_loop_hits_step_budget() {
    init_test_logging();
    // "coder" is always a valid member, so the hub re-dispatches forever.
    let decision = Arc::new(FixedDecision::new("coder"));
    let mut catalog = TopologyCatalog::with_config(EngineConfig {
        max_steps: 3,
        ..EngineConfig::default()
    });
    catalog.insert("supervisor", star(decision).build().unwrap());

    let err = catalog
        .run("supervisor", vec![Message::user("go")])
        .await
        .unwrap_err();
    assert!(matches!(err.error, TrellisError::StepBudgetExceeded(3)));
}
