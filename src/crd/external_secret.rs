//! # ExternalSecret
//!
//! Request for the operator to mirror backend entries into a cluster Secret.
//! The convergence suite creates one per case and watches its target.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ExternalSecret",
    group = "external-secrets.io",
    version = "v1alpha1",
    namespaced,
    shortname = "es"
)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretSpec {
    /// Store the entries are read from
    pub secret_store_ref: SecretStoreRef,
    /// Secret the operator writes
    pub target: ExternalSecretTarget,
    /// How often the operator re-reads the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    /// Entry-to-key mappings
    #[serde(default)]
    pub data: Vec<ExternalSecretData>,
}

/// Reference to a SecretStore or ClusterSecretStore
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreRef {
    pub name: String,
    /// `SecretStore` or `ClusterSecretStore`
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretTarget {
    /// Name of the mirrored Secret
    pub name: String,
}

/// One backend entry mapped to one key of the target Secret
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretData {
    /// Key in the target Secret
    pub secret_key: String,
    pub remote_ref: RemoteRef,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    /// Entry name in the backend
    pub key: String,
}
