//! # Kubernetes Cluster Objects
//!
//! [`ClusterObjects`] backed by the Kubernetes API.

use super::{object_ref, ClusterError, ClusterObjects};
use crate::constants::FIELD_MANAGER;
use crate::crd::{ExternalSecret, SecretStore};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

/// Cluster access through a `kube::Client`
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster").finish_non_exhaustive()
    }
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect with the default kubeconfig / in-cluster config
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    async fn create<K>(&self, obj: &K) -> Result<(), ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        K::DynamicType: Default,
    {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        let (namespace, name) = object_ref(&kind, obj.meta())?;
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match api.create(&params, obj).await {
            Ok(_) => {
                info!("Created {} {}/{}", kind, namespace, name);
                Ok(())
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                Err(ClusterError::AlreadyExists {
                    kind,
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(ClusterError::Api {
                verb: "create",
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                source: e,
            }),
        }
    }

    async fn delete<K>(&self, namespace: &str, name: &str) -> Result<(), ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);

        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Deleted {} {}/{}", kind, namespace, name);
                Ok(())
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("{} {}/{} already absent", kind, namespace, name);
                Ok(())
            }
            Err(e) => Err(ClusterError::Api {
                verb: "delete",
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                source: e,
            }),
        }
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(|e| ClusterError::Api {
            verb: "get",
            kind: K::kind(&K::DynamicType::default()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ClusterObjects for KubeCluster {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        self.create(secret).await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.delete::<Secret>(namespace, name).await
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_secret_store(&self, store: &SecretStore) -> Result<(), ClusterError> {
        self.create(store).await
    }

    async fn get_secret_store(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretStore>, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_external_secret(&self, external: &ExternalSecret) -> Result<(), ClusterError> {
        self.create(external).await
    }

    async fn delete_external_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        self.delete::<ExternalSecret>(namespace, name).await
    }
}
