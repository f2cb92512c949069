//! # Store Declaration
//!
//! Builds the SecretStore that tells the operator which vault to read and
//! where its credentials live.
//!
//! The store is named after the test namespace, so one store exists per namespace.

use crate::constants::{FIELD_MANAGER, SECRET_STORE_KIND};
use crate::credentials::{AzureCredential, CredentialKeys, AZURE_CREDENTIAL_KEYS};
use crate::crd::{
    AzureKvAuth, AzureKvProvider, SecretKeySelector, SecretStore, SecretStoreProvider,
    SecretStoreRef, SecretStoreSpec,
};
use std::collections::{BTreeMap, BTreeSet};

/// Build the Azure Key Vault SecretStore for `namespace`
///
/// The credential selectors use [`AZURE_CREDENTIAL_KEYS`], the same layout
/// [`crate::credentials::bind_credentials`] writes.
pub fn declare_azure_store(namespace: &str, credential: &AzureCredential) -> SecretStore {
    let keys = AZURE_CREDENTIAL_KEYS;
    let mut store = SecretStore::new(
        namespace,
        SecretStoreSpec {
            controller: None,
            provider: SecretStoreProvider {
                azure_kv: Some(AzureKvProvider {
                    tenant_id: credential.tenant_id().to_string(),
                    vault_url: credential.vault_url().to_string(),
                    auth_secret_ref: AzureKvAuth {
                        client_id: selector(&keys, keys.client_id),
                        client_secret: selector(&keys, keys.client_secret),
                    },
                }),
            },
        },
    );
    store.metadata.namespace = Some(namespace.to_string());
    store.metadata.labels = Some(BTreeMap::from([(
        "app.kubernetes.io/managed-by".to_string(),
        FIELD_MANAGER.to_string(),
    )]));
    store
}

fn selector(keys: &CredentialKeys, key: &str) -> SecretKeySelector {
    SecretKeySelector {
        name: keys.secret_name.to_string(),
        namespace: None,
        key: key.to_string(),
    }
}

/// Keys of the Credential Object that a store references
pub fn referenced_credential_keys(store: &SecretStore) -> BTreeSet<String> {
    store
        .spec
        .provider
        .referenced_keys(AZURE_CREDENTIAL_KEYS.secret_name)
}

/// Reference an ExternalSecret uses to point at `store`
pub fn store_ref(store_name: &str) -> SecretStoreRef {
    SecretStoreRef {
        name: store_name.to_string(),
        kind: SECRET_STORE_KIND.to_string(),
    }
}
