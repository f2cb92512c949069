//! In-memory backend for one vault endpoint.

use crate::credentials::AzureCredential;
use crate::error::HarnessError;
use crate::provider::{VaultAuthenticator, VaultBackend};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A vault endpoint that accepts one service principal
///
/// Clones share the same entries, the way two clients of one real vault do.
#[derive(Clone, Debug)]
pub struct InMemoryVault {
    endpoint: String,
    client_id: String,
    client_secret: String,
    entries: Arc<RwLock<HashMap<String, String>>>,
    reject_writes: Arc<AtomicBool>,
    authentications: Arc<AtomicUsize>,
}

impl InMemoryVault {
    /// `vault` may be a vault name or URL, like [`AzureCredential::new`]
    pub fn new(vault: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            endpoint: crate::credentials::construct_vault_url(vault),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            entries: Arc::new(RwLock::new(HashMap::new())),
            reject_writes: Arc::new(AtomicBool::new(false)),
            authentications: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Credential this vault accepts
    pub fn credential(&self, tenant_id: &str) -> AzureCredential {
        AzureCredential::new(
            self.client_id.as_str(),
            self.client_secret.as_str(),
            tenant_id,
            &self.endpoint,
        )
    }

    /// Whether a Credential Object's values identify this vault's principal
    pub fn accepts(&self, client_id: &str, client_secret: &str) -> bool {
        self.client_id == client_id && self.client_secret == client_secret
    }

    /// Make every set/delete fail until reset
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful authentications
    pub fn authentications(&self) -> usize {
        self.authentications.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            anyhow::bail!("HTTP 403 Forbidden: writes to {name} rejected");
        }
        Ok(())
    }
}

#[async_trait]
impl VaultBackend for InMemoryVault {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn set_secret(&self, name: &str, value: &str) -> Result<()> {
        self.check_writable(name)?;
        self.entries
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(name).cloned())
    }

    async fn delete_secret(&self, name: &str) -> Result<bool> {
        self.check_writable(name)?;
        Ok(self.entries.write().await.remove(name).is_some())
    }
}

#[async_trait]
impl VaultAuthenticator for InMemoryVault {
    async fn authenticate(
        &self,
        credential: &AzureCredential,
    ) -> Result<Arc<dyn VaultBackend>, HarnessError> {
        if credential.vault_url() != self.endpoint {
            return Err(HarnessError::Authentication {
                endpoint: credential.vault_url().to_string(),
                message: "no such vault".to_string(),
            });
        }
        if !self.accepts(credential.client_id(), credential.client_secret()) {
            return Err(HarnessError::Authentication {
                endpoint: self.endpoint.clone(),
                message: "AADSTS7000215: Invalid client secret provided".to_string(),
            });
        }
        self.authentications.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}
