//! # Harness Lifecycle Tests
//!
//! Integration tests for the Azure Key Vault harness against the in-memory
//! cluster and vault.
//!
//! These tests verify:
//! - Create, read and delete through the harness
//! - Idempotent deletes
//! - Front-loaded authentication
//! - The Credential Object / SecretStore key contract
//! - Setup ordering and the single-setup rule
//! - Isolation between namespaces sharing one vault
//! - Operation metrics exported by the harness

use secret_store_e2e::cluster::{ClusterError, ClusterObjects, Framework};
use secret_store_e2e::constants::CREDENTIAL_SECRET_NAME;
use secret_store_e2e::credentials::{bind_credentials, credential_object_keys, AzureCredential};
use secret_store_e2e::harness::{
    AzureHarness, HarnessRegistry, HarnessState, ProviderHarness, Registration,
};
use secret_store_e2e::observability::metrics;
use secret_store_e2e::provider::VaultBackend;
use secret_store_e2e::store::referenced_credential_keys;
use secret_store_e2e::testing::{InMemoryCluster, InMemoryVault};
use secret_store_e2e::{ErrorPhase, HarnessError};
use std::sync::Arc;

const TENANT: &str = "00000000-0000-0000-0000-000000000000";

fn vault() -> InMemoryVault {
    InMemoryVault::new("e2e-vault", "app-id", "app-secret")
}

async fn harness(
    cluster: &InMemoryCluster,
    vault: &InMemoryVault,
    namespace: &str,
) -> AzureHarness {
    let framework = Framework::new(namespace, Arc::new(cluster.clone()));
    AzureHarness::new(framework, vault.credential(TENANT), vault)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_read_delete_scenario() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut harness = harness(&cluster, &vault, "e2e-a").await;
    assert_eq!(harness.state(), HarnessState::Authenticated);

    harness.setup().await.unwrap();
    assert_eq!(harness.state(), HarnessState::Declared);

    harness.create_secret("k1", "v1").await.unwrap();
    assert_eq!(vault.get_secret("k1").await.unwrap().as_deref(), Some("v1"));

    harness.delete_secret("k1").await.unwrap();
    assert_eq!(vault.get_secret("k1").await.unwrap(), None);
    assert_eq!(harness.read_secret("k1").await.unwrap(), None);

    // Secret operations leave the state unchanged
    assert_eq!(harness.state(), HarnessState::Declared);
}

#[tokio::test]
async fn test_create_overwrites_existing_value() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-a").await;

    harness.create_secret("k1", "v1").await.unwrap();
    harness.create_secret("k1", "v2").await.unwrap();
    assert_eq!(
        harness.read_secret("k1").await.unwrap().as_deref(),
        Some("v2")
    );
}

#[tokio::test]
async fn test_delete_twice_is_not_an_error() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-a").await;

    harness.create_secret("k1", "v1").await.unwrap();
    harness.delete_secret("k1").await.unwrap();
    harness.delete_secret("k1").await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_key_succeeds() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-a").await;

    assert!(harness.delete_secret("missing-key").await.is_ok());
}

#[tokio::test]
async fn test_invalid_credentials_fail_at_construction() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let framework = Framework::new("e2e-a", Arc::new(cluster.clone()));
    let bad = AzureCredential::new("app-id", "wrong-secret", TENANT, "e2e-vault");

    let err = AzureHarness::new(framework, bad, &vault).await.unwrap_err();
    assert!(matches!(err, HarnessError::Authentication { .. }));
    assert_eq!(err.phase(), ErrorPhase::Construction);
    assert!(err.is_fatal_to_suite());

    // Nothing reached the cluster
    assert!(cluster.objects_in("e2e-a").is_empty());
}

#[tokio::test]
async fn test_credential_for_another_vault_fails_at_construction() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let framework = Framework::new("e2e-a", Arc::new(cluster));
    let elsewhere = AzureCredential::new("app-id", "app-secret", TENANT, "other-vault");

    let err = AzureHarness::new(framework, elsewhere, &vault)
        .await
        .unwrap_err();
    assert!(err.is_fatal_to_suite());
}

#[tokio::test]
async fn test_credential_keys_match_store_references() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut harness = harness(&cluster, &vault, "e2e-a").await;
    harness.setup().await.unwrap();

    let secret = cluster
        .get_secret("e2e-a", CREDENTIAL_SECRET_NAME)
        .await
        .unwrap()
        .unwrap();
    let store = cluster
        .get_secret_store("e2e-a", "e2e-a")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        credential_object_keys(&secret),
        referenced_credential_keys(&store)
    );
    let provider = store.spec.provider.azure_kv.unwrap();
    assert_eq!(provider.vault_url, vault.endpoint());
    assert_eq!(provider.tenant_id, TENANT);
}

#[tokio::test]
async fn test_second_setup_is_rejected() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut harness = harness(&cluster, &vault, "e2e-a").await;

    harness.setup().await.unwrap();
    let err = harness.setup().await.unwrap_err();
    assert!(matches!(err, HarnessError::AlreadyDeclared { .. }));
    assert_eq!(err.phase(), ErrorPhase::Setup);
    assert!(!err.is_fatal_to_suite());
    assert_eq!(cluster.objects_in("e2e-a").len(), 2);
}

#[tokio::test]
async fn test_existing_credential_object_fails_setup() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    cluster
        .create_secret(&bind_credentials("e2e-a", &vault.credential(TENANT)))
        .await
        .unwrap();

    let mut harness = harness(&cluster, &vault, "e2e-a").await;
    let err = harness.setup().await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Setup {
            source: ClusterError::AlreadyExists { .. },
            ..
        }
    ));
    assert_eq!(harness.state(), HarnessState::Authenticated);

    // The store is never declared without its credentials
    assert!(cluster
        .get_secret_store("e2e-a", "e2e-a")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_two_namespaces_share_one_vault() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut a = harness(&cluster, &vault, "e2e-a").await;
    let mut b = harness(&cluster, &vault, "e2e-b").await;
    a.setup().await.unwrap();
    b.setup().await.unwrap();

    a.create_secret("a-k1", "v1").await.unwrap();
    b.create_secret("b-k1", "v2").await.unwrap();

    a.delete_secret("a-k1").await.unwrap();
    assert_eq!(b.read_secret("a-k1").await.unwrap(), None);
    assert_eq!(b.read_secret("b-k1").await.unwrap().as_deref(), Some("v2"));
    assert_eq!(vault.authentications(), 2);
}

#[tokio::test]
async fn test_backend_rejection_is_an_operation_error() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-a").await;

    vault.set_reject_writes(true);
    let err = harness.create_secret("k1", "v1").await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Operation {
            operation: "create",
            ..
        }
    ));
    assert_eq!(err.phase(), ErrorPhase::Operation);
    assert!(harness.delete_secret("k1").await.is_err());

    vault.set_reject_writes(false);
    harness.create_secret("k1", "v1").await.unwrap();
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-a").await;

    assert!(matches!(
        harness.create_secret("", "v1").await,
        Err(HarnessError::InvalidInput(_))
    ));
    assert!(matches!(
        harness.create_secret("k1", "").await,
        Err(HarnessError::InvalidInput(_))
    ));
    assert!(vault.is_empty().await);
}

#[tokio::test]
async fn test_registration_runs_setup_once() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut registration = Registration::register(harness(&cluster, &vault, "e2e-a").await);
    assert!(!registration.is_declared());

    let harness = registration.before_each().await.unwrap();
    harness.create_secret("k1", "v1").await.unwrap();
    assert!(registration.is_declared());

    let err = registration.before_each().await.unwrap_err();
    assert!(matches!(err, HarnessError::AlreadyDeclared { .. }));
}

#[tokio::test]
async fn test_registry_rejects_shared_namespace() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let mut registry = HarnessRegistry::new();

    registry
        .register(Box::new(harness(&cluster, &vault, "e2e-a").await))
        .unwrap();
    registry
        .register(Box::new(harness(&cluster, &vault, "e2e-b").await))
        .unwrap();
    let err = registry
        .register(Box::new(harness(&cluster, &vault, "e2e-a").await))
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));

    registry.setup_all().await.unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["azure/e2e-a", "azure/e2e-b"]);
    for harness in registry.iter_mut() {
        assert_eq!(harness.state(), HarnessState::Declared);
    }
}

#[tokio::test]
async fn test_operations_are_exported_as_metrics() {
    let cluster = InMemoryCluster::new();
    let vault = vault();
    let harness = harness(&cluster, &vault, "e2e-metrics").await;

    harness.create_secret("metered", "v1").await.unwrap();
    let rendered = metrics::render().unwrap();
    assert!(rendered.contains("secret_store_e2e_vault_operations_total"));
    assert!(rendered.contains(r#"provider="azure""#));
    assert!(metrics::vault_operations_total("azure", "create") >= 1);
}
