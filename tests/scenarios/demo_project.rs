//! Test: Resolving the demo project end to end
//!
//! - Nested parameter chains resolve to concrete values
//! - Credentials are substituted in place and masked in output
//! - Repeated resolution is byte-identical

use crate::helpers::*;
use pipeconf::core::{ArtifactRule, ConfigError, ResolveError};
use pipeconf::engine::Validator;

#[tokio::test]
async fn test_demo_project_is_valid_with_predefined_parameters() {
    let project = load_demo();
    let report = Validator::default()
        .with_predefined(predefined())
        .validate(&project)
        .await;

    assert!(report.is_valid(), "{}", report);
    assert_eq!(project.pipelines.len(), 4);
}

#[tokio::test]
async fn test_demo_project_needs_orchestrator_parameters() {
    let report = pipeconf::engine::validate(&load_demo()).await;

    let mut missing: Vec<&str> = report
        .issues()
        .iter()
        .map(|issue| match &issue.error {
            ConfigError::Resolve(ResolveError::UnresolvedReference { token, .. }) => token.as_str(),
            other => panic!("unexpected issue: {}", other),
        })
        .collect();
    missing.sort();

    assert_eq!(missing, vec!["build.counter", "teamcity.build.checkoutDir"]);
}

#[tokio::test]
async fn test_resolve_android_ci() {
    let catalog = demo_catalog(live_resolver(demo_credentials())).await;
    let resolved = catalog.resolve_pipeline("Kmm", "Android_CI").await.unwrap();

    assert_eq!(resolved.name, "Android CI (debug)");

    let checkout = resolved.checkout.as_ref().unwrap();
    assert_eq!(checkout.vcs_root, "GitHubVcs");
    assert_eq!(checkout.url, "git@github.com:your-org/your-repo.git");
    assert_eq!(checkout.branch, "refs/heads/main");
    assert_eq!(checkout.branch_spec, vec!["+:refs/heads/*"]);
    assert_eq!(checkout.username.as_deref(), Some("git"));
    assert_eq!(checkout.password.as_deref(), Some(GITHUB_TOKEN));
    assert!(checkout.clean_checkout);
    assert!(checkout.use_mirrors);

    assert_eq!(
        resolved.parameters.get("env.JAVA_HOME").map(String::as_str),
        Some("/usr/lib/jvm/temurin-17-jdk")
    );
    assert_eq!(
        resolved.parameters.get("env.ANDROID_SDK_ROOT").map(String::as_str),
        Some("/opt/android-sdk")
    );
    // only pipeline-declared parameters are carried
    assert_eq!(resolved.parameters.len(), 2);

    let step = &resolved.steps[0];
    assert_eq!(step.runner, "gradle");
    assert_eq!(step.args, vec!["clean", ":app:assembleDebug", "test"]);
    assert_eq!(
        step.options.get("jdkHome").map(String::as_str),
        Some("/usr/lib/jvm/temurin-17-jdk")
    );
    assert_eq!(step.options.get("useGradleWrapper").map(String::as_str), Some("true"));

    assert_eq!(
        resolved.artifact_rules,
        vec![ArtifactRule {
            source: "app/build/outputs/**/*.apk".to_string(),
            target: Some("android-artifacts".to_string()),
        }]
    );
    assert_eq!(
        resolved.branch_filter,
        vec!["+:refs/heads/*", "-:refs/heads/release/*"]
    );
    assert_eq!(resolved.requirements.len(), 2);
}

#[tokio::test]
async fn test_resolve_android_distribute_substitutes_and_masks_secrets() {
    let catalog = demo_catalog(live_resolver(demo_credentials())).await;
    let resolved = catalog
        .resolve_pipeline("Kmm", "Android_Distribute_Firebase")
        .await
        .unwrap();

    assert_eq!(
        resolved.parameters.get("env.FIREBASE_TOKEN").map(String::as_str),
        Some(FIREBASE_TOKEN)
    );
    assert_eq!(
        resolved.parameters.get("env.ANDROID_KEYSTORE_PATH").map(String::as_str),
        Some("/work/kmm/keystore.jks")
    );

    let gradle_params = resolved.steps[0].options.get("gradleParams").unwrap();
    assert!(gradle_params.contains("-PfirebaseAppId=1:1234567890:android:abc123"));
    assert!(gradle_params.contains("-PreleaseNotes='Automated build'"));
    assert!(!gradle_params.contains('%'));

    assert_eq!(resolved.secrets().len(), 2);
    let json = resolved.to_masked_json().unwrap();
    assert!(!json.contains(FIREBASE_TOKEN));
    assert!(!json.contains(GITHUB_TOKEN));
    assert!(json.contains("***"));
}

#[tokio::test]
async fn test_resolve_ios_testflight_uses_build_counter() {
    let catalog = demo_catalog(live_resolver(demo_credentials())).await;
    let resolved = catalog.resolve_pipeline("Kmm", "iOS_TestFlight").await.unwrap();

    assert_eq!(resolved.parameters.get("env.BUILD_NUMBER").map(String::as_str), Some("42"));
    assert_eq!(resolved.parameters.get("env.ASC_KEY_P8_BASE64").map(String::as_str), Some(ASC_P8));
    assert_eq!(resolved.parameters.get("env.ASC_KEY_ID").map(String::as_str), Some(""));
    assert_eq!(resolved.steps.len(), 2);
    assert_eq!(resolved.steps[1].name, "fastlane beta");
}

#[tokio::test]
async fn test_repeated_resolution_is_byte_identical() {
    let catalog = demo_catalog(live_resolver(demo_credentials())).await;

    for pipeline in ["Android_CI", "Android_Distribute_Firebase", "iOS_TestFlight", "iOS_Firebase_Distribution"] {
        let first = catalog.resolve_pipeline("Kmm", pipeline).await.unwrap();
        let second = catalog.resolve_pipeline("Kmm", pipeline).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.to_masked_json().unwrap(), second.to_masked_json().unwrap());
    }
}

#[tokio::test]
async fn test_static_resolution_keeps_credential_ids() {
    let catalog = demo_catalog(pipeconf::resolve::Resolver::static_mode()).await;
    let resolved = catalog
        .resolve_pipeline("Kmm", "iOS_Firebase_Distribution")
        .await
        .unwrap();

    assert_eq!(
        resolved.parameters.get("env.FIREBASE_TOKEN").map(String::as_str),
        Some("FIREBASE_TOKEN")
    );
    assert_eq!(
        resolved.checkout.as_ref().and_then(|c| c.password.as_deref()),
        Some("GITHUB_TOKEN")
    );
    assert!(resolved.secrets().is_empty());
}
