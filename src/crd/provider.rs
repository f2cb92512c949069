//! # Provider Configuration
//!
//! Backend configuration types embedded in a SecretStore.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Backend selection
/// Exactly one provider field is set; Kubernetes sends `{"azurekv": {...}}`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreProvider {
    /// Microsoft Azure Key Vault
    #[serde(default, rename = "azurekv", skip_serializing_if = "Option::is_none")]
    pub azure_kv: Option<AzureKvProvider>,
}

/// Azure Key Vault provider configuration
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureKvProvider {
    /// Azure AD tenant of the service principal
    pub tenant_id: String,
    /// Vault URL, e.g. `https://my-vault.vault.azure.net/`
    pub vault_url: String,
    /// Where the operator reads the service principal credentials
    pub auth_secret_ref: AzureKvAuth,
}

/// Service principal credential references
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureKvAuth {
    pub client_id: SecretKeySelector,
    pub client_secret: SecretKeySelector,
}

impl AzureKvAuth {
    /// All selectors in this auth block
    pub fn selectors(&self) -> [&SecretKeySelector; 2] {
        [&self.client_id, &self.client_secret]
    }
}

/// Reference to one key of a Secret
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Secret namespace; defaults to the store's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Key inside the Secret
    pub key: String,
}

impl SecretStoreProvider {
    /// Keys this provider reads from the named Secret
    pub fn referenced_keys(&self, secret_name: &str) -> BTreeSet<String> {
        self.azure_kv
            .iter()
            .flat_map(|kv| kv.auth_secret_ref.selectors())
            .filter(|sel| sel.name == secret_name)
            .map(|sel| sel.key.clone())
            .collect()
    }
}
