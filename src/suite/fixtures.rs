//! Collision-free names for namespaces, vault keys and values.
//!
//! Vault keys outlive a failed test (no rollback), so every run picks fresh
//! names instead of relying on cleanup.

use uuid::Uuid;

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Namespace name such as `e2e-1a2b3c4d`
pub fn unique_namespace(prefix: &str) -> String {
    format!("{prefix}-{}", short_id())
}

/// Vault key such as `sync-1a2b3c4d`
///
/// Key Vault names allow only alphanumerics and dashes.
pub fn unique_key(prefix: &str) -> String {
    format!("{prefix}-{}", short_id())
}

/// Random value for a seeded entry
pub fn random_value() -> String {
    Uuid::new_v4().to_string()
}
