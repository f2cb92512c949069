//! # Convergence Suite
//!
//! Backend-agnostic convergence checks, written once against
//! [`ProviderHarness`]:
//!
//! 1. seed entries in the backend through the harness
//! 2. declare an ExternalSecret referencing the harness's store
//! 3. poll the mirrored Secret until it holds the expected data
//! 4. delete the seeded entries and the ExternalSecret
//!
//! The suite never drives the operator. It only observes cluster state, with
//! its own interval and timeout.

mod fixtures;

pub use fixtures::{random_value, unique_key, unique_namespace};

use crate::cluster::ClusterObjects;
use crate::config::PollSettings;
use crate::constants::DEFAULT_REFRESH_INTERVAL;
use crate::crd::{
    ExternalSecret, ExternalSecretData, ExternalSecretSpec, ExternalSecretTarget, RemoteRef,
    SecretStoreRef,
};
use crate::harness::{HarnessState, ProviderHarness};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// One backend entry and the key it should land under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub remote_key: String,
    pub value: String,
    pub target_key: String,
}

/// A named convergence case: entries to seed and the Secret they should produce
#[derive(Debug, Clone)]
pub struct SyncCase {
    /// Name of the ExternalSecret and of its target Secret
    pub name: String,
    pub entries: Vec<SyncEntry>,
}

impl SyncCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry
    pub fn entry(
        mut self,
        remote_key: impl Into<String>,
        value: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        self.entries.push(SyncEntry {
            remote_key: remote_key.into(),
            value: value.into(),
            target_key: target_key.into(),
        });
        self
    }

    /// Single random entry under a fresh key, the basic "create then expect
    /// mirrored" case
    pub fn single(prefix: &str) -> Self {
        Self::new(unique_key(prefix)).entry(unique_key(prefix), random_value(), "value")
    }

    /// ExternalSecret requesting this case's entries from `store`
    pub fn external_secret(&self, namespace: &str, store: SecretStoreRef) -> ExternalSecret {
        let mut external = ExternalSecret::new(
            &self.name,
            ExternalSecretSpec {
                secret_store_ref: store,
                target: ExternalSecretTarget {
                    name: self.name.clone(),
                },
                refresh_interval: Some(DEFAULT_REFRESH_INTERVAL.to_string()),
                data: self
                    .entries
                    .iter()
                    .map(|e| ExternalSecretData {
                        secret_key: e.target_key.clone(),
                        remote_ref: RemoteRef {
                            key: e.remote_key.clone(),
                        },
                    })
                    .collect(),
            },
        );
        external.metadata.namespace = Some(namespace.to_string());
        external
    }

    /// Data the mirrored Secret must contain
    pub fn expected_data(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.target_key.clone(), e.value.clone()))
            .collect()
    }
}

/// Runs [`SyncCase`]s against any declared harness
#[derive(Clone)]
pub struct ConvergenceSuite {
    cluster: Arc<dyn ClusterObjects>,
    poll: PollSettings,
}

impl std::fmt::Debug for ConvergenceSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvergenceSuite")
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl ConvergenceSuite {
    pub fn new(cluster: Arc<dyn ClusterObjects>, poll: PollSettings) -> Self {
        Self { cluster, poll }
    }

    /// Seed, declare, wait for convergence, clean up
    ///
    /// Cleanup always runs: every seeded entry is deleted and the ExternalSecret
    /// is removed, even when convergence times out. The mirrored Secret goes
    /// away with the namespace.
    /// # Errors
    /// The convergence error if there is one, otherwise the first cleanup error
    pub async fn run_case<H>(&self, harness: &H, case: &SyncCase) -> Result<()>
    where
        H: ProviderHarness + ?Sized,
    {
        if harness.state() != HarnessState::Declared {
            anyhow::bail!(
                "{} harness for {} is {}, run setup first",
                harness.name(),
                harness.namespace(),
                harness.state().as_str()
            );
        }

        let span = info_span!(
            "suite.case",
            provider = harness.name(),
            namespace = harness.namespace(),
            case = %case.name
        );
        async {
            for entry in &case.entries {
                harness
                    .create_secret(&entry.remote_key, &entry.value)
                    .await
                    .with_context(|| format!("Failed to seed {}", entry.remote_key))?;
            }

            let external = case.external_secret(harness.namespace(), harness.store_ref());
            self.cluster
                .create_external_secret(&external)
                .await
                .with_context(|| format!("Failed to declare ExternalSecret {}", case.name))?;

            let converged = wait_for_secret_data(
                self.cluster.as_ref(),
                harness.namespace(),
                &case.name,
                &case.expected_data(),
                self.poll,
            )
            .await;
            let cleaned = self.cleanup(harness, case).await;

            converged?;
            cleaned?;
            info!("Case {} converged", case.name);
            Ok::<(), anyhow::Error>(())
        }
        .instrument(span)
        .await
    }

    /// Delete every seeded entry and the ExternalSecret, keeping the first error
    async fn cleanup<H>(&self, harness: &H, case: &SyncCase) -> Result<()>
    where
        H: ProviderHarness + ?Sized,
    {
        let mut first_error: Option<anyhow::Error> = None;

        for entry in &case.entries {
            if let Err(e) = harness.delete_secret(&entry.remote_key).await {
                warn!("Cleanup of {} failed: {}", entry.remote_key, e);
                first_error.get_or_insert(
                    anyhow::Error::new(e)
                        .context(format!("Failed to delete seeded entry {}", entry.remote_key)),
                );
            }
        }

        if let Err(e) = self
            .cluster
            .delete_external_secret(harness.namespace(), &case.name)
            .await
        {
            warn!("Cleanup of ExternalSecret {} failed: {}", case.name, e);
            first_error.get_or_insert(
                anyhow::Error::new(e)
                    .context(format!("Failed to delete ExternalSecret {}", case.name)),
            );
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Poll `namespace/name` until it holds every expected key with the expected value
///
/// Extra keys in the Secret are ignored. Returns the converged Secret.
/// # Errors
/// Fails after `poll.timeout`, reporting what was last observed
pub async fn wait_for_secret_data(
    cluster: &dyn ClusterObjects,
    namespace: &str,
    name: &str,
    expected: &BTreeMap<String, String>,
    poll: PollSettings,
) -> Result<Secret> {
    let deadline = tokio::time::Instant::now() + poll.timeout;
    let mut last_seen: Option<BTreeMap<String, String>> = None;

    loop {
        if let Some(secret) = cluster.get_secret(namespace, name).await? {
            let observed = secret_data(&secret);
            if expected.iter().all(|(k, v)| observed.get(k) == Some(v)) {
                return Ok(secret);
            }
            debug!(
                "Secret {}/{} has keys {:?}, waiting",
                namespace,
                name,
                observed.keys().collect::<Vec<_>>()
            );
            last_seen = Some(observed);
        }

        if tokio::time::Instant::now() >= deadline {
            let last = match last_seen {
                Some(data) => format!("keys {:?}", data.keys().collect::<Vec<_>>()),
                None => "no Secret".to_string(),
            };
            anyhow::bail!(
                "Secret {}/{} did not converge within {:?}; last saw {}",
                namespace,
                name,
                poll.timeout,
                last
            );
        }
        tokio::time::sleep(poll.interval).await;
    }
}

/// All values of a Secret, merging `data` (decoded) with `stringData`
pub fn secret_data(secret: &Secret) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = secret
        .data
        .iter()
        .flatten()
        .filter_map(|(k, v)| String::from_utf8(v.0.clone()).ok().map(|s| (k.clone(), s)))
        .collect();
    if let Some(string_data) = &secret.string_data {
        values.extend(string_data.clone());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::store_ref;
    use crate::testing::InMemoryCluster;
    use k8s_openapi::ByteString;
    use kube::api::ObjectMeta;
    use std::time::Duration;

    #[test]
    fn test_case_builds_external_secret() {
        let case = SyncCase::new("mirror")
            .entry("remote-a", "1", "a")
            .entry("remote-b", "2", "b");
        let es = case.external_secret("ns", store_ref("ns"));

        assert_eq!(es.metadata.namespace.as_deref(), Some("ns"));
        assert_eq!(es.spec.target.name, "mirror");
        assert_eq!(es.spec.secret_store_ref.kind, "SecretStore");
        assert_eq!(es.spec.data.len(), 2);
        assert_eq!(es.spec.data[1].remote_ref.key, "remote-b");
        assert_eq!(case.expected_data().get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_secret_data_merges_string_data() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                "a".to_string(),
                ByteString(b"from-data".to_vec()),
            )])),
            string_data: Some(BTreeMap::from([("b".to_string(), "from-string".to_string())])),
            ..Default::default()
        };
        let data = secret_data(&secret);
        assert_eq!(data.get("a").map(String::as_str), Some("from-data"));
        assert_eq!(data.get("b").map(String::as_str), Some("from-string"));
    }

    #[tokio::test]
    async fn test_wait_times_out_without_secret() {
        let cluster = InMemoryCluster::new();
        let poll = PollSettings {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(30),
        };
        let expected = BTreeMap::from([("value".to_string(), "x".to_string())]);

        let err = wait_for_secret_data(&cluster, "ns", "missing", &expected, poll)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not converge"));
    }

    #[tokio::test]
    async fn test_wait_returns_existing_secret() {
        let cluster = InMemoryCluster::new();
        cluster
            .upsert_secret(Secret {
                metadata: ObjectMeta {
                    name: Some("mirror".to_string()),
                    namespace: Some("ns".to_string()),
                    ..Default::default()
                },
                data: Some(BTreeMap::from([(
                    "value".to_string(),
                    ByteString(b"x".to_vec()),
                )])),
                ..Default::default()
            })
            .unwrap();
        let expected = BTreeMap::from([("value".to_string(), "x".to_string())]);

        let secret = wait_for_secret_data(&cluster, "ns", "mirror", &expected, PollSettings::default())
            .await
            .unwrap();
        assert_eq!(secret.metadata.name.as_deref(), Some("mirror"));
    }
}
