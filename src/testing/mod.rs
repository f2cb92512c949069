//! # Testing Collaborators
//!
//! In-memory stand-ins for the cluster, the backend and the operator, used by
//! this crate's tests and by suites that want to exercise harness logic
//! without a cluster or a vault.

mod cluster;
mod reconciler;
mod vault;

pub use cluster::InMemoryCluster;
pub use reconciler::FakeReconciler;
pub use vault::InMemoryVault;
