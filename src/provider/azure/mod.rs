//! # Azure Key Vault Client
//!
//! Client for interacting with Azure Key Vault Secrets API.
//!
//! This module provides functionality to:
//! - Create and update secrets in Azure Key Vault
//! - Retrieve secret values
//! - Delete secrets, tolerating absent ones, and purge the soft-deleted copy
//!   so a later run can reuse the name

mod auth;
mod client;

pub use auth::StaticTokenCredential;
pub use client::deleted_secret_url;

use crate::constants::{PURGE_MAX_ATTEMPTS, PURGE_RETRY_DELAY_MS};
use crate::credentials::AzureCredential;
use crate::error::HarnessError;
use crate::provider::{VaultAuthenticator, VaultBackend};
use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_core::http::StatusCode as AzureStatusCode;
use azure_security_keyvault_secrets::{
    models::{SecretAttributes, SetSecretParameters},
    SecretClient,
};
use reqwest::{Client as ReqwestClient, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument};

use self::auth::access_token;
use self::client::create_client_components;

/// Azure Key Vault client behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultSettings {
    /// Purge soft-deleted secrets after deleting them
    pub purge_on_delete: bool,
    /// Use a static token (Key Vault emulator) instead of Azure AD
    pub static_token: bool,
    /// Base delay between purge attempts, multiplied by the attempt number
    pub purge_retry_delay: Duration,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            purge_on_delete: true,
            static_token: false,
            purge_retry_delay: Duration::from_millis(PURGE_RETRY_DELAY_MS),
        }
    }
}

/// Azure Key Vault backend, owned by one harness instance
pub struct AzureKeyVault {
    client: SecretClient,
    vault_url: String,
    http_client: ReqwestClient,
    credential: Arc<dyn TokenCredential>,
    purge_on_delete: bool,
    purge_retry_delay: Duration,
}

impl std::fmt::Debug for AzureKeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureKeyVault")
            .field("vault_url", &self.vault_url)
            .field("purge_on_delete", &self.purge_on_delete)
            .finish_non_exhaustive()
    }
}

impl AzureKeyVault {
    /// Authenticate and create a client scoped to the credential's vault
    /// # Errors
    /// Returns `HarnessError::Authentication` if the token request fails or the
    /// vault rejects the principal
    pub async fn connect(
        credential: &AzureCredential,
        settings: &VaultSettings,
    ) -> Result<Self, HarnessError> {
        let vault_url = credential.vault_url().to_string();
        let span = info_span!("azure.keyvault.connect", vault.url = %vault_url);

        async move {
            let components = create_client_components(credential, settings)
                .await
                .map_err(|e| HarnessError::authentication(&vault_url, &e))?;

            Ok(Self {
                client: components.client,
                vault_url,
                http_client: components.http_client,
                credential: components.credential,
                purge_on_delete: settings.purge_on_delete,
                purge_retry_delay: settings.purge_retry_delay,
            })
        }
        .instrument(span)
        .await
    }

    /// Purge a soft-deleted secret
    ///
    /// Right after a delete the vault may still report the secret as being
    /// deleted (409) or not yet listed (404); both are retried when a delete
    /// just happened.
    async fn purge_deleted_secret(&self, secret_name: &str, just_deleted: bool) -> Result<()> {
        let url = deleted_secret_url(&self.vault_url, secret_name);

        for attempt in 1..=PURGE_MAX_ATTEMPTS {
            let token = access_token(self.credential.as_ref()).await?;
            let response = self
                .http_client
                .delete(&url)
                .bearer_auth(token)
                .send()
                .await
                .context("Failed to purge Azure secret")?;

            let status = response.status();
            if status.is_success() {
                debug!("Purged deleted Azure secret {}", secret_name);
                return Ok(());
            }

            let retryable = status == StatusCode::CONFLICT
                || (status == StatusCode::NOT_FOUND && just_deleted);
            if status == StatusCode::NOT_FOUND && !retryable {
                return Ok(());
            }
            if retryable && attempt < PURGE_MAX_ATTEMPTS {
                debug!(
                    "Azure secret {} not purgeable yet (HTTP {}), attempt {}",
                    secret_name, status, attempt
                );
                tokio::time::sleep(self.purge_retry_delay * attempt).await;
                continue;
            }
            if status == StatusCode::NOT_FOUND {
                // Never showed up as deleted: the vault has soft-delete disabled
                return Ok(());
            }

            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Failed to purge Azure secret {}: HTTP {} - {}",
                secret_name,
                status,
                error_text
            ));
        }

        Err(anyhow::anyhow!(
            "Azure secret {secret_name} still not purgeable after {PURGE_MAX_ATTEMPTS} attempts"
        ))
    }
}

/// Whether an Azure SDK error means the secret does not exist
pub(crate) fn is_not_found(error: &azure_core::Error) -> bool {
    not_found(error.http_status(), &error.to_string())
}

/// 404 is the only not-found status; the `SecretNotFound` code is checked
/// only when the error carries no status
fn not_found(status: Option<AzureStatusCode>, message: &str) -> bool {
    match status {
        Some(status) => status == AzureStatusCode::NotFound,
        None => message.contains("SecretNotFound"),
    }
}

#[async_trait]
impl VaultBackend for AzureKeyVault {
    fn endpoint(&self) -> &str {
        &self.vault_url
    }

    async fn set_secret(&self, secret_name: &str, secret_value: &str) -> Result<()> {
        let span = info_span!(
            "azure.keyvault.secret.set",
            secret.name = secret_name,
            vault.url = %self.vault_url
        );

        async move {
            info!("Setting Azure secret: {}", secret_name);
            let parameters = SetSecretParameters {
                value: Some(secret_value.to_string()),
                secret_attributes: Some(SecretAttributes {
                    enabled: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            };
            self.client
                .set_secret(secret_name, parameters.try_into()?, None)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to set Azure secret {secret_name}: {e}"))?;
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn get_secret(&self, secret_name: &str) -> Result<Option<String>> {
        let span = tracing::debug_span!(
            "azure.keyvault.secret.get",
            secret.name = secret_name,
            vault.url = %self.vault_url
        );

        async move {
            match self.client.get_secret(secret_name, None).await {
                Ok(response) => {
                    use azure_security_keyvault_secrets::models::Secret;
                    let secret = serde_json::from_slice::<Secret>(&response.into_body())
                        .context("Failed to deserialize Azure secret response")?;
                    Ok(secret.value)
                }
                Err(e) if is_not_found(&e) => {
                    debug!("Azure secret {} not found", secret_name);
                    Ok(None)
                }
                Err(e) => Err(anyhow::anyhow!(
                    "Failed to get Azure secret {secret_name}: {e}"
                )),
            }
        }
        .instrument(span)
        .await
    }

    async fn delete_secret(&self, secret_name: &str) -> Result<bool> {
        let span = info_span!(
            "azure.keyvault.secret.delete",
            secret.name = secret_name,
            vault.url = %self.vault_url
        );

        async move {
            info!("Deleting Azure secret: {}", secret_name);
            let existed = match self.client.delete_secret(secret_name, None).await {
                Ok(_) => true,
                Err(e) if is_not_found(&e) => {
                    debug!("Azure secret {} already absent", secret_name);
                    false
                }
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Failed to delete Azure secret {secret_name}: {e}"
                    ))
                }
            };

            if self.purge_on_delete {
                self.purge_deleted_secret(secret_name, existed).await?;
            }
            Ok(existed)
        }
        .instrument(span)
        .await
    }
}

/// Authenticator producing [`AzureKeyVault`] clients
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureAuthenticator {
    pub settings: VaultSettings,
}

impl AzureAuthenticator {
    pub fn new(settings: VaultSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl VaultAuthenticator for AzureAuthenticator {
    async fn authenticate(
        &self,
        credential: &AzureCredential,
    ) -> Result<Arc<dyn VaultBackend>, HarnessError> {
        let vault = AzureKeyVault::connect(credential, &self.settings).await?;
        Ok(Arc::new(vault))
    }
}
