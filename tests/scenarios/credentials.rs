//! Test: Credential lookups during resolution
//!
//! - Each credential is fetched once per resolution
//! - Slow stores are cut off by the timeout
//! - Store failures surface as errors, never as empty values

use crate::helpers::*;
use pipeconf::core::{ConfigError, CredentialError, ResolveError};
use pipeconf::engine::CatalogError;
use pipeconf::resolve::{InMemoryCredentialStore, ResolverConfig};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn credential_failure(err: &CatalogError) -> (&str, &CredentialError) {
    match err {
        CatalogError::Resolution { issues, .. } => issues
            .iter()
            .find_map(|issue| match &issue.error {
                ConfigError::Resolve(ResolveError::CredentialLookup {
                    credential_id,
                    source,
                    ..
                }) => Some((credential_id.as_str(), source)),
                _ => None,
            })
            .expect("expected a credential lookup issue"),
        other => panic!("expected resolution failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_each_credential_fetched_once_per_resolution() {
    let store = CountingCredentialStore::new(demo_credentials());
    let fetches = store.counter();
    let catalog = demo_catalog(live_resolver(store)).await;

    // install compiles only triggers and requirements, which reference no credentials
    assert_eq!(fetches.load(Ordering::SeqCst), 0);

    catalog
        .resolve_pipeline("Kmm", "iOS_Firebase_Distribution")
        .await
        .unwrap();
    // GITHUB_TOKEN for checkout, FIREBASE_TOKEN and ASC_P8_B64 for parameters
    assert_eq!(fetches.load(Ordering::SeqCst), 3);

    catalog
        .resolve_pipeline("Kmm", "iOS_Firebase_Distribution")
        .await
        .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_missing_credential_is_an_error() {
    let credentials = InMemoryCredentialStore::new().with("GITHUB_TOKEN", GITHUB_TOKEN);
    let catalog = demo_catalog(live_resolver(credentials)).await;

    let err = catalog
        .resolve_pipeline("Kmm", "Android_Distribute_Firebase")
        .await
        .unwrap_err();

    let (credential_id, source) = credential_failure(&err);
    assert_eq!(credential_id, "FIREBASE_TOKEN");
    assert_eq!(source, &CredentialError::NotFound);
}

#[tokio::test]
async fn test_slow_credential_store_times_out() {
    let store = SlowCredentialStore {
        delay: Duration::from_secs(5),
    };
    let config = ResolverConfig::new().with_timeout(Duration::from_millis(20));
    let catalog = demo_catalog(live_resolver_with(store, config)).await;

    let started = std::time::Instant::now();
    let err = catalog.resolve_pipeline("Kmm", "Android_CI").await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    let (credential_id, source) = credential_failure(&err);
    assert_eq!(credential_id, "GITHUB_TOKEN");
    assert_eq!(source, &CredentialError::Timeout(Duration::from_millis(20)));
}

#[tokio::test]
async fn test_backend_failure_is_reported_with_referrer() {
    let catalog = demo_catalog(live_resolver(FailingCredentialStore)).await;
    let err = catalog
        .resolve_pipeline("Kmm", "Android_Distribute_Firebase")
        .await
        .unwrap_err();

    let CatalogError::Resolution { issues, .. } = &err else {
        panic!("expected resolution failure, got {:?}", err);
    };
    // checkout password and env.FIREBASE_TOKEN both fail
    assert_eq!(issues.len(), 2);
    assert!(issues
        .iter()
        .any(|issue| issue.location == "Android_Distribute_Firebase.vcs.auth.password"));
    assert!(issues
        .iter()
        .any(|issue| issue.location == "Android_Distribute_Firebase.params.env.FIREBASE_TOKEN"));

    let (_, source) = credential_failure(&err);
    assert!(matches!(source, CredentialError::Backend(_)));
}

#[tokio::test]
async fn test_secret_handles_are_redacted() {
    let catalog = demo_catalog(live_resolver(demo_credentials())).await;
    let resolved = catalog
        .resolve_pipeline("Kmm", "iOS_TestFlight")
        .await
        .unwrap();

    assert_eq!(resolved.secrets().len(), 2);
    for secret in resolved.secrets() {
        assert_eq!(format!("{}", secret), "***");
        assert_eq!(format!("{:?}", secret), "SecretHandle(***)");
    }
}
