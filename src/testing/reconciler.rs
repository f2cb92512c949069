//! Minimal stand-in for the operator's ExternalSecret reconciler.

use super::{InMemoryCluster, InMemoryVault};
use crate::cluster::ClusterObjects;
use crate::crd::{ExternalSecret, SecretKeySelector};
use crate::provider::VaultBackend;
use crate::suite::secret_data;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Mirrors vault entries into target Secrets, like the operator does
///
/// Only syncs an ExternalSecret when its store points at this vault and the
/// Credential Object it references holds the principal the vault accepts.
#[derive(Clone, Debug)]
pub struct FakeReconciler {
    cluster: InMemoryCluster,
    vault: InMemoryVault,
}

impl FakeReconciler {
    pub fn new(cluster: InMemoryCluster, vault: InMemoryVault) -> Self {
        Self { cluster, vault }
    }

    /// One pass over every ExternalSecret; returns how many targets were written
    pub async fn reconcile_once(&self) -> Result<usize> {
        let mut synced = 0;
        for external in self.cluster.external_secrets() {
            match self.reconcile(&external).await {
                Ok(true) => synced += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    "Skipping ExternalSecret {:?}: {:#}",
                    external.metadata.name, e
                ),
            }
        }
        Ok(synced)
    }

    /// Reconcile every `interval` until the handle is aborted
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(e) = self.reconcile_once().await {
                    warn!("Reconcile pass failed: {:#}", e);
                }
                tokio::time::sleep(interval).await;
            }
        })
    }

    async fn reconcile(&self, external: &ExternalSecret) -> Result<bool> {
        let namespace = external
            .metadata
            .namespace
            .as_deref()
            .context("ExternalSecret has no namespace")?;
        let store_name = &external.spec.secret_store_ref.name;

        let Some(store) = self.cluster.get_secret_store(namespace, store_name).await? else {
            debug!("SecretStore {}/{} not found yet", namespace, store_name);
            return Ok(false);
        };
        let provider = store
            .spec
            .provider
            .azure_kv
            .as_ref()
            .context("SecretStore has no azurekv provider")?;

        if provider.vault_url != self.vault.endpoint() {
            anyhow::bail!(
                "store points at {} but this vault is {}",
                provider.vault_url,
                self.vault.endpoint()
            );
        }

        let auth = &provider.auth_secret_ref;
        let client_id = self.selector_value(namespace, &auth.client_id).await?;
        let client_secret = self.selector_value(namespace, &auth.client_secret).await?;
        if !self.vault.accepts(&client_id, &client_secret) {
            anyhow::bail!("credentials referenced by store {store_name} were rejected");
        }

        let mut data = BTreeMap::new();
        for item in &external.spec.data {
            let Some(value) = self.vault.get_secret(&item.remote_ref.key).await? else {
                debug!("Entry {} not in vault yet", item.remote_ref.key);
                return Ok(false);
            };
            data.insert(item.secret_key.clone(), ByteString(value.into_bytes()));
        }

        self.cluster.upsert_secret(Secret {
            metadata: ObjectMeta {
                name: Some(external.spec.target.name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        })?;
        Ok(true)
    }

    async fn selector_value(&self, namespace: &str, selector: &SecretKeySelector) -> Result<String> {
        let namespace = selector.namespace.as_deref().unwrap_or(namespace);
        let secret = self
            .cluster
            .get_secret(namespace, &selector.name)
            .await?
            .with_context(|| format!("Secret {}/{} not found", namespace, selector.name))?;
        secret_data(&secret)
            .remove(&selector.key)
            .with_context(|| format!("key {} missing from {}", selector.key, selector.name))
    }
}
