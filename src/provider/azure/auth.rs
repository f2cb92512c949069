//! # Azure Key Vault Authentication
//!
//! Builds the token credential from the same service principal written into the
//! Credential Object, and fetches Key Vault access tokens.

use super::VaultSettings;
use crate::constants::AZURE_KEY_VAULT_SCOPE;
use crate::credentials::AzureCredential;
use anyhow::{Context, Result};
use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use azure_identity::ClientSecretCredential;
use std::sync::Arc;
use tracing::{debug, info};

/// Static TokenCredential for the Key Vault emulator
/// Returns a dummy token without attempting real Azure authentication
#[derive(Debug)]
pub struct StaticTokenCredential;

#[async_trait::async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        use typespec_client_core::time::{Duration, OffsetDateTime};

        Ok(AccessToken::new(
            Secret::new("test-token".to_string()),
            OffsetDateTime::now_utc() + Duration::seconds(3600),
        ))
    }
}

/// Create the token credential for a service principal
pub fn create_credential(
    credential: &AzureCredential,
    settings: &VaultSettings,
) -> Result<Arc<dyn TokenCredential>> {
    if settings.static_token {
        debug!("Mock mode: using static Azure credential");
        return Ok(Arc::new(StaticTokenCredential));
    }

    info!(
        "Using Azure service principal authentication with client ID: {} (tenant {})",
        credential.client_id(),
        credential.tenant_id()
    );
    let token_credential: Arc<dyn TokenCredential> = ClientSecretCredential::new(
        credential.tenant_id(),
        credential.client_id().to_string(),
        Secret::new(credential.client_secret().to_string()),
        None,
    )
    .context("Failed to create ClientSecretCredential")?;

    Ok(token_credential)
}

/// Fetch a Key Vault access token
pub async fn access_token(credential: &dyn TokenCredential) -> Result<String> {
    let token_response = credential
        .get_token(&[AZURE_KEY_VAULT_SCOPE], Some(TokenRequestOptions::default()))
        .await
        .context("Failed to get Azure Key Vault access token")?;
    Ok(token_response.token.secret().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_in_mock_mode() {
        let credential = AzureCredential::new("c", "s", "t", "http://localhost:1236/");
        let settings = VaultSettings {
            purge_on_delete: false,
            static_token: true,
            ..Default::default()
        };
        let token_credential = create_credential(&credential, &settings).unwrap();
        let token = access_token(token_credential.as_ref()).await.unwrap();
        assert_eq!(token, "test-token");
    }
}
