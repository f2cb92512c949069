//! # Credential Binder
//!
//! Materializes backend credentials as the namespaced Secret the operator reads.
//!
//! The key names written here are the same ones the SecretStore references.
//! Both sides read them from [`AZURE_CREDENTIAL_KEYS`], never from literals.

use crate::constants::{CLIENT_ID_KEY, CLIENT_SECRET_KEY, CREDENTIAL_SECRET_NAME, FIELD_MANAGER};
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Service principal identity for one Azure Key Vault
///
/// Immutable for the lifetime of a test. The client secret is wiped on drop
/// and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AzureCredential {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    vault_url: String,
}

impl std::fmt::Debug for AzureCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredential")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("vault_url", &self.vault_url)
            .finish_non_exhaustive()
    }
}

impl AzureCredential {
    /// Create a credential; `vault` may be a vault name or a full URL
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        vault: &str,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            vault_url: construct_vault_url(vault),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Normalized vault URL, always ending in `/`
    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }
}

/// Construct vault URL from vault name
/// Supports both full URLs and vault names
pub fn construct_vault_url(vault: &str) -> String {
    let vault = vault.trim();
    if vault.starts_with("https://") || vault.starts_with("http://") {
        if vault.ends_with('/') {
            vault.to_string()
        } else {
            format!("{vault}/")
        }
    } else {
        format!("https://{vault}.vault.azure.net/")
    }
}

/// Name and key layout of a Credential Object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialKeys {
    /// Secret object name
    pub secret_name: &'static str,
    /// Key holding the client ID
    pub client_id: &'static str,
    /// Key holding the client secret
    pub client_secret: &'static str,
}

/// The key contract between the Credential Binder and the Store Declaration
pub const AZURE_CREDENTIAL_KEYS: CredentialKeys = CredentialKeys {
    secret_name: CREDENTIAL_SECRET_NAME,
    client_id: CLIENT_ID_KEY,
    client_secret: CLIENT_SECRET_KEY,
};

impl CredentialKeys {
    /// Every key the Credential Object carries
    pub fn key_set(&self) -> BTreeSet<String> {
        [self.client_id, self.client_secret]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Build the Credential Object for `namespace`
pub fn bind_credentials(namespace: &str, credential: &AzureCredential) -> Secret {
    let keys = AZURE_CREDENTIAL_KEYS;
    let string_data = BTreeMap::from([
        (keys.client_id.to_string(), credential.client_id().to_string()),
        (
            keys.client_secret.to_string(),
            credential.client_secret().to_string(),
        ),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(keys.secret_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                "app.kubernetes.io/managed-by".to_string(),
                FIELD_MANAGER.to_string(),
            )])),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    }
}

/// Keys present in a Credential Object, from `stringData` and `data`
pub fn credential_object_keys(secret: &Secret) -> BTreeSet<String> {
    let string_keys = secret.string_data.iter().flat_map(BTreeMap::keys);
    let data_keys = secret.data.iter().flat_map(BTreeMap::keys);
    string_keys.chain(data_keys).cloned().collect()
}
