//! Test: Validation reports every defect of a project
//!
//! - A missing VCS root is reported exactly once
//! - Independent defects are still reported alongside it
//! - Invalid projects are never installed

use crate::helpers::*;
use pipeconf::core::config::ProjectConfig;
use pipeconf::core::{ConfigError, EntityKind, ResolveError};
use pipeconf::engine::{Catalog, CatalogError, Validator};
use pipeconf::resolve::Resolver;

fn validator() -> Validator {
    Validator::default().with_predefined(predefined())
}

#[tokio::test]
async fn test_missing_vcs_root_reported_exactly_once() {
    let mut project = load_demo();
    project.pipelines[0].vcs_root = "GitLabVcs".to_string();

    let report = validator().validate(&project).await;

    assert_eq!(report.len(), 1, "{}", report);
    assert_eq!(report.issues()[0].location, "Android_CI.vcs_root");
    assert_eq!(
        report.issues()[0].error,
        ConfigError::MissingVcsRoot {
            pipeline: "Android_CI".to_string(),
            root: "GitLabVcs".to_string(),
        }
    );
}

#[tokio::test]
async fn test_independent_errors_still_reported() {
    let yaml = r#"
id: Broken
name: Broken
params:
  loop.a: "%loop.b%"
  loop.b: "%loop.a%"
vcs_roots:
  - name: Repo
    url: "%REPO_URL%"
  - name: Repo
    url: git@example.com:dup.git
pipelines:
  - id: Build
    name: Build
    vcs_root: Missing
    steps:
      - name: compile
        runner: script
        args: ["make %TARGET%"]
    triggers:
      branch_filter: |
        +:refs/heads/**
  - id: Test
    name: Test
    vcs_root: Repo
    steps:
      - name: test
        runner: script
        args: ["%loop.a%"]
    requirements:
      - kind: contains
        key: ""
        value: linux
  - id: Test
    name: Test again
    vcs_root: Repo
"#;
    let project = ProjectConfig::from_yaml(yaml).unwrap().to_project().unwrap();
    let report = validator().validate(&project).await;
    let locations: Vec<&str> = report.issues().iter().map(|i| i.location.as_str()).collect();

    assert!(report.issues().iter().any(|i| matches!(
        i.error,
        ConfigError::DuplicateIdentity { entity: EntityKind::VcsRoot, .. }
    )));
    assert!(report.issues().iter().any(|i| matches!(
        i.error,
        ConfigError::DuplicateIdentity { entity: EntityKind::Pipeline, .. }
    )));
    assert!(locations.contains(&"Build.vcs_root"));
    assert!(locations.contains(&"Build.steps[0].args[0]"));
    assert!(locations.contains(&"Build.branch_filter[0]"));
    assert!(locations.contains(&"Test.vcs.url"));
    assert!(locations.contains(&"Test.steps[0].args[0]"));
    assert!(locations.contains(&"Test.requirements[0]"));

    let cycle = report
        .issues()
        .iter()
        .find_map(|i| match &i.error {
            ConfigError::Resolve(ResolveError::CyclicReference { cycle }) => Some(cycle.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(cycle, vec!["loop.a", "loop.b", "loop.a"]);
}

#[tokio::test]
async fn test_invalid_project_is_not_installed() {
    let mut project = load_demo();
    project.pipelines[1].vcs_root = "Nope".to_string();

    let mut catalog = Catalog::new(Resolver::static_mode()).with_predefined(predefined());
    let err = catalog.install(project).await.unwrap_err();

    match err {
        CatalogError::Invalid(report) => assert_eq!(report.len(), 1),
        other => panic!("expected invalid project, got {:?}", other),
    }
    assert!(catalog.project("Kmm").is_none());
    assert!(matches!(
        catalog.is_trigger_applicable("Android_CI", "refs/heads/main"),
        Err(CatalogError::UnknownPipeline(_))
    ));
}

#[tokio::test]
async fn test_failed_reinstall_keeps_previous_project() {
    let mut catalog = demo_catalog(Resolver::static_mode()).await;

    let mut broken = load_demo();
    broken.pipelines[0].vcs_root = "Nope".to_string();
    assert!(catalog.install(broken).await.is_err());

    assert_eq!(catalog.project("Kmm").unwrap().pipelines[0].vcs_root, "GitHubVcs");
    assert!(catalog.is_trigger_applicable("Android_CI", "refs/heads/main").unwrap());
}
