//! Test: Trigger applicability and agent selection
//!
//! - Branch filters follow last-match-wins with default deny
//! - Requirements select agents from the demo inventory
//! - The catalog answers the same from many concurrent tasks

use crate::helpers::*;
use pipeconf::agent::{Agent, AgentInventory, AgentProvider};
use pipeconf::engine::Catalog;
use pipeconf::resolve::Resolver;
use std::sync::Arc;

async fn catalog() -> Catalog {
    demo_catalog(Resolver::static_mode()).await
}

async fn demo_agents() -> Vec<Agent> {
    AgentInventory::from_file(demo_path("agents.yaml"))
        .unwrap()
        .agents()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_android_ci_branch_filter() {
    let catalog = catalog().await;

    assert!(catalog.is_trigger_applicable("Android_CI", "refs/heads/main").unwrap());
    assert!(catalog.is_trigger_applicable("Android_CI", "refs/heads/feature-x").unwrap());
    assert!(!catalog
        .is_trigger_applicable("Android_CI", "refs/heads/release/1.0")
        .unwrap());
    assert!(!catalog.is_trigger_applicable("Android_CI", "refs/tags/v1.0").unwrap());
    // '*' stays within one path segment
    assert!(!catalog
        .is_trigger_applicable("Android_CI", "refs/heads/feature/login")
        .unwrap());
}

#[tokio::test]
async fn test_release_pipelines_branch_filters() {
    let catalog = catalog().await;

    assert!(catalog
        .is_trigger_applicable("Android_Distribute_Firebase", "refs/heads/release/2.1")
        .unwrap());
    assert!(catalog
        .is_trigger_applicable("Android_Distribute_Firebase", "refs/tags/v2.1.0")
        .unwrap());
    assert!(!catalog
        .is_trigger_applicable("Android_Distribute_Firebase", "refs/heads/main")
        .unwrap());

    assert!(catalog
        .is_trigger_applicable("iOS_TestFlight", "refs/tags/ios-v3")
        .unwrap());
    assert!(!catalog
        .is_trigger_applicable("iOS_TestFlight", "refs/tags/v3")
        .unwrap());
}

#[tokio::test]
async fn test_pipeline_without_trigger_never_fires() {
    let catalog = catalog().await;

    for ref_name in ["refs/heads/main", "refs/heads/release/1.0", "refs/tags/ios-v1"] {
        assert!(!catalog
            .is_trigger_applicable("iOS_Firebase_Distribution", ref_name)
            .unwrap());
    }
}

#[tokio::test]
async fn test_triggered_pipelines_in_declared_order() {
    let catalog = catalog().await;

    assert_eq!(
        catalog.triggered_pipelines("refs/heads/release/2.0"),
        vec!["Android_Distribute_Firebase", "iOS_TestFlight"]
    );
    assert_eq!(catalog.triggered_pipelines("refs/heads/main"), vec!["Android_CI"]);
    assert!(catalog.triggered_pipelines("refs/pull/12/head").is_empty());
}

#[tokio::test]
async fn test_agent_selection() {
    let catalog = catalog().await;
    let agents = demo_agents().await;

    assert_eq!(
        catalog.select_eligible_agents("Android_CI", &agents).unwrap(),
        vec!["linux-android-1"]
    );
    assert_eq!(
        catalog
            .select_eligible_agents("Android_Distribute_Firebase", &agents)
            .unwrap(),
        vec!["linux-android-1", "mac-mini-1"]
    );
    // contains(key, "") only requires the attribute to be present
    assert_eq!(
        catalog.select_eligible_agents("iOS_TestFlight", &agents).unwrap(),
        vec!["mac-mini-1"]
    );
    assert_eq!(
        catalog
            .select_eligible_agents("iOS_Firebase_Distribution", &agents)
            .unwrap(),
        vec!["mac-mini-1", "mac-mini-2"]
    );
}

#[tokio::test]
async fn test_explain_agents_lists_failed_requirements() {
    let catalog = catalog().await;
    let agents = demo_agents().await;

    let evaluations = catalog.explain_agents("Android_CI", &agents).unwrap();
    assert_eq!(evaluations.len(), 3);

    let mac = &evaluations[1];
    assert_eq!(mac.agent_id, "mac-mini-1");
    assert!(!mac.outcome.eligible);
    assert_eq!(
        mac.outcome.failed.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["doesNotContain(teamcity.agent.jvm.os.name, \"Mac\")"]
    );

    // mac-mini-2 fails both requirements
    assert_eq!(evaluations[2].outcome.failed.len(), 2);
}

#[tokio::test]
async fn test_concurrent_evaluation() {
    let catalog = Arc::new(demo_catalog(live_resolver(demo_credentials())).await);
    let agents = Arc::new(demo_agents().await);
    let expected = catalog
        .resolve_pipeline("Kmm", "Android_Distribute_Firebase")
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let catalog = catalog.clone();
        let agents = agents.clone();
        handles.push(tokio::spawn(async move {
            let ref_name = if i % 2 == 0 { "refs/heads/release/1.0" } else { "refs/heads/main" };
            let triggered = catalog
                .is_trigger_applicable("Android_Distribute_Firebase", ref_name)
                .unwrap();
            let eligible = catalog
                .select_eligible_agents("Android_Distribute_Firebase", &agents)
                .unwrap();
            let resolved = catalog
                .resolve_pipeline("Kmm", "Android_Distribute_Firebase")
                .await
                .unwrap();
            (i, triggered, eligible, resolved)
        }));
    }

    for handle in handles {
        let (i, triggered, eligible, resolved) = handle.await.unwrap();
        assert_eq!(triggered, i % 2 == 0);
        assert_eq!(eligible, vec!["linux-android-1", "mac-mini-1"]);
        assert_eq!(resolved, expected);
    }
}
