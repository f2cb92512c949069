//! # Custom Resource Definitions
//!
//! Typed views of the operator's custom resources, limited to the fields the
//! harness writes or reads.
//!
//! - [`SecretStore`] points the operator at a backend and its credentials
//! - [`ExternalSecret`] asks the operator to mirror backend entries into a Secret

mod external_secret;
mod provider;

pub use external_secret::*;
pub use provider::*;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SecretStore Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: external-secrets.io/v1alpha1
/// kind: SecretStore
/// metadata:
///   name: e2e-1a2b3c4d
///   namespace: e2e-1a2b3c4d
/// spec:
///   provider:
///     azurekv:
///       tenantId: 00000000-0000-0000-0000-000000000000
///       vaultUrl: https://my-vault.vault.azure.net/
///       authSecretRef:
///         clientId:
///           name: provider-secret
///           key: client-id
///         clientSecret:
///           name: provider-secret
///           key: client-secret
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "SecretStore",
    group = "external-secrets.io",
    version = "v1alpha1",
    namespaced,
    status = "SecretStoreStatus",
    shortname = "ss"
)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreSpec {
    /// Restricts the store to one operator instance (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Backend configuration
    pub provider: SecretStoreProvider,
}

/// Status written by the operator
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub last_transition_time: Option<String>,
}
