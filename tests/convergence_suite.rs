//! # Convergence Suite Tests
//!
//! Runs the generic convergence cases against the Azure harness, with a fake
//! reconciler standing in for the operator.
//!
//! These tests verify:
//! - Seeded entries are mirrored into the target Secret
//! - Seeded entries and the ExternalSecret are removed after each case
//! - A failed cleanup fails the case and still attempts every delete
//! - A store the operator cannot use never converges

use async_trait::async_trait;
use secret_store_e2e::cluster::{ClusterObjects, Framework};
use secret_store_e2e::config::PollSettings;
use secret_store_e2e::crd::SecretStoreRef;
use secret_store_e2e::harness::{
    AzureHarness, HarnessRegistry, HarnessState, ProviderHarness, Registration,
};
use secret_store_e2e::HarnessError;
use secret_store_e2e::observability::init_tracing;
use secret_store_e2e::suite::{secret_data, unique_namespace, ConvergenceSuite, SyncCase};
use secret_store_e2e::testing::{FakeReconciler, InMemoryCluster, InMemoryVault};
use std::sync::Arc;
use std::time::Duration;

fn fast_poll() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    }
}

struct Env {
    cluster: InMemoryCluster,
    vault: InMemoryVault,
    reconciler: tokio::task::JoinHandle<()>,
}

impl Env {
    fn start() -> Self {
        init_tracing();
        let cluster = InMemoryCluster::new();
        let vault = InMemoryVault::new("e2e-vault", "app-id", "app-secret");
        let reconciler = FakeReconciler::new(cluster.clone(), vault.clone())
            .spawn(Duration::from_millis(10));
        Self {
            cluster,
            vault,
            reconciler,
        }
    }

    async fn harness(&self, namespace: &str) -> AzureHarness {
        let framework = Framework::new(namespace, Arc::new(self.cluster.clone()));
        AzureHarness::new(framework, self.vault.credential("tenant"), &self.vault)
            .await
            .unwrap()
    }

    fn suite(&self, poll: PollSettings) -> ConvergenceSuite {
        ConvergenceSuite::new(Arc::new(self.cluster.clone()), poll)
    }
}

/// Azure harness whose deletes fail for one key
struct FailingDelete {
    inner: AzureHarness,
    failing_key: String,
}

#[async_trait]
impl ProviderHarness for FailingDelete {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    fn state(&self) -> HarnessState {
        self.inner.state()
    }

    fn store_ref(&self) -> SecretStoreRef {
        self.inner.store_ref()
    }

    async fn setup(&mut self) -> Result<(), HarnessError> {
        self.inner.setup().await
    }

    async fn create_secret(&self, key: &str, value: &str) -> Result<(), HarnessError> {
        self.inner.create_secret(key, value).await
    }

    async fn delete_secret(&self, key: &str) -> Result<(), HarnessError> {
        if key == self.failing_key {
            return Err(HarnessError::Operation {
                operation: "delete",
                key: key.to_string(),
                message: "vault refused the delete".to_string(),
            });
        }
        self.inner.delete_secret(key).await
    }

    async fn read_secret(&self, key: &str) -> Result<Option<String>, HarnessError> {
        self.inner.read_secret(key).await
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}

#[tokio::test]
async fn test_single_entry_converges() {
    let env = Env::start();
    let namespace = unique_namespace("e2e");
    let mut registration = Registration::register(env.harness(&namespace).await);
    let harness = registration.before_each().await.unwrap();

    let case = SyncCase::single("sync");
    env.suite(fast_poll()).run_case(&*harness, &case).await.unwrap();

    let mirrored = env
        .cluster
        .get_secret(&namespace, &case.name)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(secret_data(&mirrored), case.expected_data());

    // Seeded entries and the ExternalSecret are cleaned up after the case
    assert!(env.vault.is_empty().await);
    assert!(env.cluster.external_secrets().is_empty());
}

#[tokio::test]
async fn test_failed_cleanup_fails_the_case() {
    let env = Env::start();
    let namespace = unique_namespace("e2e");
    let mut harness = FailingDelete {
        inner: env.harness(&namespace).await,
        failing_key: "stuck-key".to_string(),
    };
    harness.setup().await.unwrap();

    let case = SyncCase::new("partial-cleanup")
        .entry("stuck-key", "v1", "first")
        .entry("other-key", "v2", "second");
    let err = env
        .suite(fast_poll())
        .run_case(&harness, &case)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("stuck-key"));

    // The case converged, the other entry and the ExternalSecret were still removed
    assert_eq!(env.vault.len().await, 1);
    assert_eq!(harness.read_secret("stuck-key").await.unwrap().as_deref(), Some("v1"));
    assert_eq!(harness.read_secret("other-key").await.unwrap(), None);
    assert!(env.cluster.external_secrets().is_empty());
}

#[tokio::test]
async fn test_multiple_entries_converge() {
    let env = Env::start();
    let namespace = unique_namespace("e2e");
    let mut registration = Registration::register(env.harness(&namespace).await);
    let harness = registration.before_each().await.unwrap();

    let case = SyncCase::new("db-credentials")
        .entry("db-user", "admin", "username")
        .entry("db-pass", "hunter2", "password");
    env.suite(fast_poll()).run_case(&*harness, &case).await.unwrap();
}

#[tokio::test]
async fn test_case_requires_setup() {
    let env = Env::start();
    let harness = env.harness(&unique_namespace("e2e")).await;

    let err = env
        .suite(fast_poll())
        .run_case(&harness, &SyncCase::single("sync"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run setup first"));
    assert!(env.vault.is_empty().await);
}

#[tokio::test]
async fn test_rejected_credentials_never_converge() {
    let env = Env::start();
    let namespace = unique_namespace("e2e");
    let mut harness = env.harness(&namespace).await;
    harness.setup().await.unwrap();

    // Replace the Credential Object with one the vault does not accept
    env.cluster
        .delete_secret(&namespace, "provider-secret")
        .await
        .unwrap();
    let wrong = secret_store_e2e::credentials::AzureCredential::new(
        "app-id",
        "rotated",
        "tenant",
        "e2e-vault",
    );
    env.cluster
        .create_secret(&secret_store_e2e::credentials::bind_credentials(
            &namespace, &wrong,
        ))
        .await
        .unwrap();

    let poll = PollSettings {
        interval: Duration::from_millis(10),
        timeout: Duration::from_millis(200),
    };
    let err = env
        .suite(poll)
        .run_case(&harness, &SyncCase::single("sync"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("did not converge"));

    // Cleanup still ran
    assert!(env.vault.is_empty().await);
}

#[tokio::test]
async fn test_suite_runs_over_registry() {
    let env = Env::start();
    let mut registry = HarnessRegistry::new();
    for _ in 0..2 {
        let harness = env.harness(&unique_namespace("e2e")).await;
        registry.register(Box::new(harness)).unwrap();
    }
    registry.setup_all().await.unwrap();

    let suite = env.suite(fast_poll());
    for harness in registry.iter_mut() {
        let harness: &dyn ProviderHarness = harness.as_ref();
        suite
            .run_case(harness, &SyncCase::single("sync"))
            .await
            .unwrap();
    }
}
