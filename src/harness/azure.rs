//! # Azure Key Vault Harness
//!
//! Reference [`ProviderHarness`] binding for Azure Key Vault.

use super::{validate_input, HarnessState, ProviderHarness};
use crate::cluster::Framework;
use crate::constants::AZURE_PROVIDER_NAME;
use crate::credentials::{bind_credentials, AzureCredential};
use crate::crd::SecretStoreRef;
use crate::error::HarnessError;
use crate::observability::metrics;
use crate::provider::{VaultAuthenticator, VaultBackend};
use crate::store::{declare_azure_store, store_ref};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// Azure Key Vault harness
///
/// Owns its backend client; nothing is shared with other instances.
pub struct AzureHarness {
    credential: AzureCredential,
    framework: Framework,
    vault: Arc<dyn VaultBackend>,
    state: HarnessState,
}

impl std::fmt::Debug for AzureHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureHarness")
            .field("namespace", &self.framework.namespace())
            .field("vault_url", &self.credential.vault_url())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AzureHarness {
    /// Authenticate and create a harness for `framework`'s namespace
    ///
    /// The vault client is built from the same credential that `setup` writes
    /// into the cluster, so both sides use one identity and one endpoint.
    /// # Errors
    /// Returns a construction-phase error if authentication fails
    pub async fn new(
        framework: Framework,
        credential: AzureCredential,
        authenticator: &dyn VaultAuthenticator,
    ) -> Result<Self, HarnessError> {
        if let Err(e) = metrics::register_metrics() {
            warn!("Failed to register harness metrics: {:#}", e);
        }
        let vault = authenticator.authenticate(&credential).await?;

        if vault.endpoint() != credential.vault_url() {
            return Err(HarnessError::Config(format!(
                "backend client is scoped to {} but the store declares {}",
                vault.endpoint(),
                credential.vault_url()
            )));
        }

        info!(
            "Azure harness authenticated for namespace {} against {}",
            framework.namespace(),
            credential.vault_url()
        );

        Ok(Self {
            credential,
            framework,
            vault,
            state: HarnessState::Authenticated,
        })
    }

    pub fn credential(&self) -> &AzureCredential {
        &self.credential
    }

    fn record(&self, operation: &str, start: Instant, ok: bool) {
        metrics::observe_vault_operation(AZURE_PROVIDER_NAME, operation, start, ok);
    }
}

#[async_trait]
impl ProviderHarness for AzureHarness {
    fn name(&self) -> &str {
        AZURE_PROVIDER_NAME
    }

    fn namespace(&self) -> &str {
        self.framework.namespace()
    }

    fn state(&self) -> HarnessState {
        self.state
    }

    fn store_ref(&self) -> SecretStoreRef {
        store_ref(self.framework.namespace())
    }

    async fn setup(&mut self) -> Result<(), HarnessError> {
        let namespace = self.framework.namespace().to_string();
        if self.state == HarnessState::Declared {
            warn!("Setup called twice for namespace {}", namespace);
            return Err(HarnessError::AlreadyDeclared { namespace });
        }

        let span = info_span!("harness.setup", provider = AZURE_PROVIDER_NAME, namespace = %namespace);
        async {
            let cluster = self.framework.cluster();

            // The store must not exist before the credentials it references
            let credentials = bind_credentials(&namespace, &self.credential);
            cluster
                .create_secret(&credentials)
                .await
                .map_err(|source| HarnessError::Setup {
                    namespace: namespace.clone(),
                    source,
                })?;

            let store = declare_azure_store(&namespace, &self.credential);
            cluster
                .create_secret_store(&store)
                .await
                .map_err(|source| HarnessError::Setup {
                    namespace: namespace.clone(),
                    source,
                })?;

            self.state = HarnessState::Declared;
            info!("Declared SecretStore {}/{}", namespace, namespace);
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn create_secret(&self, key: &str, value: &str) -> Result<(), HarnessError> {
        validate_input(key, Some(value))?;
        let start = Instant::now();
        let result = self.vault.set_secret(key, value).await;
        self.record("create", start, result.is_ok());
        result.map_err(|e| HarnessError::operation("create", key, &e))
    }

    async fn delete_secret(&self, key: &str) -> Result<(), HarnessError> {
        validate_input(key, None)?;
        let start = Instant::now();
        let result = self.vault.delete_secret(key).await;
        self.record("delete", start, result.is_ok());
        result
            .map(|_existed| ())
            .map_err(|e| HarnessError::operation("delete", key, &e))
    }

    async fn read_secret(&self, key: &str) -> Result<Option<String>, HarnessError> {
        validate_input(key, None)?;
        let start = Instant::now();
        let result = self.vault.get_secret(key).await;
        self.record("get", start, result.is_ok());
        result.map_err(|e| HarnessError::operation("get", key, &e))
    }
}
