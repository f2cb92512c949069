//! In-memory cluster with API-server create/delete semantics.

use crate::cluster::{object_ref, ClusterError, ClusterObjects};
use crate::crd::{ExternalSecret, SecretStore};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Key = (String, String);

#[derive(Debug, Default)]
struct Objects {
    secrets: BTreeMap<Key, Secret>,
    stores: BTreeMap<Key, SecretStore>,
    externals: BTreeMap<Key, ExternalSecret>,
}

/// Namespaced object store; creating an existing name is a conflict
///
/// Clones share state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCluster {
    objects: Arc<Mutex<Objects>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Objects> {
        // A poisoned lock only means another test thread panicked
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Write a Secret the way the operator would: create or replace
    pub fn upsert_secret(&self, secret: Secret) -> Result<(), ClusterError> {
        let (namespace, name) = object_ref("Secret", &secret.metadata)?;
        let key = (namespace.to_string(), name.to_string());
        self.lock().secrets.insert(key, secret);
        Ok(())
    }

    /// Every ExternalSecret currently declared
    pub fn external_secrets(&self) -> Vec<ExternalSecret> {
        self.lock().externals.values().cloned().collect()
    }

    /// Names of all objects in a namespace, as `Kind/name`
    pub fn objects_in(&self, namespace: &str) -> Vec<String> {
        let objects = self.lock();
        let secrets = objects
            .secrets
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| format!("Secret/{name}"));
        let stores = objects
            .stores
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| format!("SecretStore/{name}"));
        let externals = objects
            .externals
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| format!("ExternalSecret/{name}"));
        secrets.chain(stores).chain(externals).collect()
    }
}

fn insert_new<T: Clone>(
    map: &mut BTreeMap<Key, T>,
    kind: &str,
    meta: &kube::api::ObjectMeta,
    obj: &T,
) -> Result<(), ClusterError> {
    let (namespace, name) = object_ref(kind, meta)?;
    let key = (namespace.to_string(), name.to_string());
    if map.contains_key(&key) {
        return Err(ClusterError::AlreadyExists {
            kind: kind.to_string(),
            namespace: key.0,
            name: key.1,
        });
    }
    map.insert(key, obj.clone());
    Ok(())
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[async_trait]
impl ClusterObjects for InMemoryCluster {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        insert_new(&mut self.lock().secrets, "Secret", &secret.metadata, secret)
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.lock().secrets.remove(&key(namespace, name));
        Ok(())
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, ClusterError> {
        Ok(self.lock().secrets.get(&key(namespace, name)).cloned())
    }

    async fn create_secret_store(&self, store: &SecretStore) -> Result<(), ClusterError> {
        insert_new(&mut self.lock().stores, "SecretStore", &store.metadata, store)
    }

    async fn get_secret_store(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretStore>, ClusterError> {
        Ok(self.lock().stores.get(&key(namespace, name)).cloned())
    }

    async fn create_external_secret(&self, external: &ExternalSecret) -> Result<(), ClusterError> {
        insert_new(
            &mut self.lock().externals,
            "ExternalSecret",
            &external.metadata,
            external,
        )
    }

    async fn delete_external_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        self.lock().externals.remove(&key(namespace, name));
        Ok(())
    }
}
