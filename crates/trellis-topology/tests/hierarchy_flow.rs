//! End-to-end flows through the three-tier hierarchy.

use std::sync::Arc;

use trellis_core::message::{Author, Message};

use trellis_topology::{HierarchicalTopology, TeamSpec, TopologyCatalog};

use trellis_test_utils::{entered_nodes, init_test_logging, FixedDecision, StaticAction};

fn tree(root_choice: &str, team_choice: &str) -> HierarchicalTopology {
    HierarchicalTopology::new(Arc::new(FixedDecision::new(root_choice)))
        .add_team(
            TeamSpec::new("research_team", Arc::new(FixedDecision::new(team_choice)))
                .add_worker("researcher", Arc::new(StaticAction::new("literature reviewed")))
                .add_worker("data_collector", Arc::new(StaticAction::new("data gathered"))),
        )
        .add_team(
            TeamSpec::new("execution_team", Arc::new(FixedDecision::new(team_choice)))
                .add_worker("coder", Arc::new(StaticAction::new("feature built")))
                .add_worker("tester", Arc::new(StaticAction::new("all tests green"))),
        )
}

#[tokio::test]
async fn test_delegation_descends_and_reports_ascend() {
    init_test_logging();
    let mut catalog = TopologyCatalog::new();
    catalog.insert("hierarchy", tree("execution_team", "tester").build().unwrap());
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("hierarchy", vec![Message::user("verify the release")])
        .await
        .unwrap();

    assert_eq!(
        entered_nodes(&mut events),
        vec!["root", "execution_team", "tester", "execution_team", "root"]
    );

    let authors: Vec<String> = messages.iter().map(|m| m.author.to_string()).collect();
    assert_eq!(
        authors,
        vec!["user", "root", "execution_team", "tester", "execution_team"]
    );
    assert_eq!(messages[3].content, "all tests green");
    assert_eq!(messages[4].content, "team task complete");

    let seqs: Vec<u64> = messages.iter().map(|m| m.sequence()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_research_path() {
    init_test_logging();
    let mut catalog = TopologyCatalog::new();
    catalog.insert(
        "hierarchy",
        tree("research_team", "data_collector").build().unwrap(),
    );
    let mut events = catalog.subscribe();

    let messages = catalog
        .run("hierarchy", vec![Message::user("collect usage numbers")])
        .await
        .unwrap();

    assert_eq!(
        entered_nodes(&mut events),
        vec!["root", "research_team", "data_collector", "research_team", "root"]
    );
    assert_eq!(messages[3].author, Author::agent("data_collector"));
    assert_eq!(messages[3].content, "data gathered");
}

#[tokio::test]
async fn test_unknown_team_choice_uses_default_team() {
    init_test_logging();
    // Root oracle answers nonsense; the first team is the configured default.
    let mut catalog = TopologyCatalog::new();
    catalog.insert("hierarchy", tree("quality_team", "researcher").build().unwrap());
    let mut events = catalog.subscribe();

    catalog
        .run("hierarchy", vec![Message::user("look into this")])
        .await
        .unwrap();

    let nodes = entered_nodes(&mut events);
    assert_eq!(nodes[1], "research_team");
}

#[tokio::test]
async fn test_unknown_worker_choice_uses_team_default() {
    init_test_logging();
    let mut catalog = TopologyCatalog::new();
    catalog.insert("hierarchy", tree("execution_team", "superhero").build().unwrap());
    let mut events = catalog.subscribe();

    catalog
        .run("hierarchy", vec![Message::user("build it")])
        .await
        .unwrap();

    let nodes = entered_nodes(&mut events);
    assert_eq!(nodes[2], "coder");
}
