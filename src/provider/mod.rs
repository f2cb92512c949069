//! # Vault Operations
//!
//! Direct, authenticated access to an external secret backend, bypassing the
//! operator. Used to seed entries before assertions and remove them afterwards.
//!
//! ## Sub-modules
//!
//! - `azure` - Azure Key Vault binding

pub mod azure;

use crate::credentials::AzureCredential;
use crate::error::HarnessError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Secret entry access for one backend endpoint
///
/// Calls block until the backend acknowledges. No retries at this layer.
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// Endpoint this client is scoped to
    fn endpoint(&self) -> &str;

    /// Create or overwrite an entry
    async fn set_secret(&self, name: &str, value: &str) -> Result<()>;

    /// Latest value of an entry, `None` if it does not exist
    async fn get_secret(&self, name: &str) -> Result<Option<String>>;

    /// Delete an entry
    /// Returns false if the entry was already absent (not an error)
    async fn delete_secret(&self, name: &str) -> Result<bool>;
}

/// Exchanges a credential for an authenticated backend client
///
/// Authentication happens here, before any harness operation is reachable.
#[async_trait]
pub trait VaultAuthenticator: Send + Sync {
    async fn authenticate(
        &self,
        credential: &AzureCredential,
    ) -> Result<Arc<dyn VaultBackend>, HarnessError>;
}
