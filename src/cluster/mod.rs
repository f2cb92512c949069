//! # Cluster Objects
//!
//! The harness creates and deletes three kinds of namespaced objects: the
//! Credential Object, the SecretStore and (from the suite) ExternalSecrets.
//! [`ClusterObjects`] is that seam; [`KubeCluster`] talks to a real API server
//! and [`crate::testing::InMemoryCluster`] keeps everything in memory.

mod kube_cluster;

pub use kube_cluster::KubeCluster;

use crate::crd::{ExternalSecret, SecretStore};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the cluster collaborator
#[derive(Debug, Error)]
pub enum ClusterError {
    /// An object with this name already exists in the namespace
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Object is missing required metadata
    #[error("{kind} is missing metadata.{field}")]
    InvalidObject { kind: String, field: &'static str },

    /// The API server rejected the request
    #[error("{verb} {kind} {namespace}/{name} failed: {source}")]
    Api {
        verb: &'static str,
        kind: String,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}

/// Create/delete/read access to the namespaced objects the harness manages
///
/// Deleting an absent object is not an error.
#[async_trait]
pub trait ClusterObjects: Send + Sync {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError>;
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
    async fn get_secret(&self, namespace: &str, name: &str)
        -> Result<Option<Secret>, ClusterError>;

    async fn create_secret_store(&self, store: &SecretStore) -> Result<(), ClusterError>;
    async fn get_secret_store(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretStore>, ClusterError>;

    async fn create_external_secret(&self, external: &ExternalSecret) -> Result<(), ClusterError>;
    async fn delete_external_secret(&self, namespace: &str, name: &str)
        -> Result<(), ClusterError>;
}

/// Per-test view of the cluster: one namespace plus the object collaborator
///
/// Namespace creation and teardown belong to the test runner.
#[derive(Clone)]
pub struct Framework {
    namespace: String,
    cluster: Arc<dyn ClusterObjects>,
}

impl std::fmt::Debug for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl Framework {
    pub fn new(namespace: impl Into<String>, cluster: Arc<dyn ClusterObjects>) -> Self {
        Self {
            namespace: namespace.into(),
            cluster,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn cluster(&self) -> &Arc<dyn ClusterObjects> {
        &self.cluster
    }
}

/// Namespace and name of an object, or the field that is missing
pub(crate) fn object_ref<'a>(
    kind: &str,
    meta: &'a kube::api::ObjectMeta,
) -> Result<(&'a str, &'a str), ClusterError> {
    let namespace = meta
        .namespace
        .as_deref()
        .ok_or_else(|| ClusterError::InvalidObject {
            kind: kind.to_string(),
            field: "namespace",
        })?;
    let name = meta
        .name
        .as_deref()
        .ok_or_else(|| ClusterError::InvalidObject {
            kind: kind.to_string(),
            field: "name",
        })?;
    Ok((namespace, name))
}
