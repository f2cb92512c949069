//! # SecretStore E2E Harness
//!
//! Provider test harness for end-to-end verification of an operator that
//! mirrors secrets from an external vault into Kubernetes Secrets.
//!
//! ## Overview
//!
//! For each test namespace a harness:
//!
//! 1. **Authenticates** - Builds a vault client from the test credential, failing fast on bad credentials
//! 2. **Binds credentials** - Writes the credential into a namespaced Secret (`provider-secret`)
//! 3. **Declares the store** - Creates a `SecretStore` that points the operator at the vault and that Secret
//! 4. **Mutates the vault** - Creates and deletes entries directly, bypassing the operator
//!
//! Convergence tests in [`suite`] are written once against [`harness::ProviderHarness`] and
//! run against any registered backend. Azure Key Vault is the reference binding.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: tests register a harness and call `before_each` themselves
//! - **Typed errors**: every operation returns a `Result` classified by phase
//! - **Idempotent cleanup**: deleting an absent entry succeeds, soft-deleted entries are purged
//! - **In-memory collaborators**: [`testing`] runs the whole flow without a cluster or a vault
//!
//! ## Usage
//!
//! ```no_run
//! use secret_store_e2e::cluster::{Framework, KubeCluster};
//! use secret_store_e2e::config::HarnessConfig;
//! use secret_store_e2e::harness::{AzureHarness, ProviderHarness, Registration};
//! use secret_store_e2e::provider::azure::AzureAuthenticator;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = HarnessConfig::from_env()?;
//! let cluster = Arc::new(KubeCluster::try_default().await?);
//! let framework = Framework::new("e2e-1a2b3c4d", cluster);
//! let authenticator = AzureAuthenticator::new(config.vault);
//!
//! let harness = AzureHarness::new(framework, config.credential, &authenticator).await?;
//! let mut registration = Registration::register(harness);
//! let harness = registration.before_each().await?;
//! harness.create_secret("k1", "v1").await?;
//! harness.delete_secret("k1").await?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod crd;
pub mod error;
pub mod harness;
pub mod observability;
pub mod provider;
pub mod store;
pub mod suite;
pub mod testing;

pub use error::{ErrorPhase, HarnessError};
