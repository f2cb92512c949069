//! # Azure Key Vault Client Creation
//!
//! Handles creation and initialization of the Azure Key Vault client.
//! Authentication is front-loaded: a token is fetched and one read is sent to
//! the vault before the client is handed out, so bad credentials, a principal
//! without access and an unreachable vault all fail at construction time.

use super::auth::{access_token, create_credential};
use super::{is_not_found, VaultSettings};
use crate::constants::{AZURE_KEY_VAULT_API_VERSION, VAULT_REACHABILITY_SECRET};
use crate::credentials::AzureCredential;
use anyhow::{Context, Result};
use azure_core::credentials::TokenCredential;
use azure_security_keyvault_secrets::SecretClient;
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use tracing::{debug, info};

/// Authenticated Key Vault client parts
pub(crate) struct ClientComponents {
    pub client: SecretClient,
    pub http_client: ReqwestClient,
    pub credential: Arc<dyn TokenCredential>,
}

/// Create Azure Key Vault client components
pub(crate) async fn create_client_components(
    credential: &AzureCredential,
    settings: &VaultSettings,
) -> Result<ClientComponents> {
    let vault_url = credential.vault_url();
    let token_credential = create_credential(credential, settings)?;

    access_token(token_credential.as_ref())
        .await
        .with_context(|| format!("Service principal could not authenticate for {vault_url}"))?;
    info!("Authenticated against Azure Key Vault {}", vault_url);

    let client = SecretClient::new(vault_url, Arc::clone(&token_credential), None)
        .context("Failed to create Azure Key Vault SecretClient")?;

    match client.get_secret(VAULT_REACHABILITY_SECRET, None).await {
        Ok(_) => {}
        Err(e) if is_not_found(&e) => {}
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Key Vault {vault_url} did not accept requests from this principal: {e}"
            ))
        }
    }
    debug!("Key Vault {} is reachable", vault_url);

    let http_client = ReqwestClient::builder()
        .build()
        .context("Failed to create HTTP client")?;

    Ok(ClientComponents {
        client,
        http_client,
        credential: token_credential,
    })
}

/// URL of a soft-deleted secret, used to purge it
pub fn deleted_secret_url(vault_url: &str, secret_name: &str) -> String {
    format!(
        "{}/deletedsecrets/{}?api-version={}",
        vault_url.trim_end_matches('/'),
        secret_name,
        AZURE_KEY_VAULT_API_VERSION
    )
}
