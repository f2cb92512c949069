//! # Provider Harness
//!
//! The capability set every backend binding implements, so convergence tests
//! are written once and run against any backend.
//!
//! ## Lifecycle
//!
//! ```text
//! Unauthenticated --construct--> Authenticated --setup--> Declared
//! ```
//!
//! Construction authenticates against the backend. `setup` binds credentials
//! and declares the store, once. Secret operations leave the state unchanged.
//! Teardown is the namespace deletion done by the test runner.
//!
//! Tests register a harness explicitly with [`Registration`] and call
//! [`Registration::before_each`] at the start of each test body.

mod azure;
mod registry;

pub use azure::AzureHarness;
pub use registry::{HarnessRegistry, Registration};

use crate::crd::SecretStoreRef;
use crate::error::HarnessError;
use async_trait::async_trait;

/// Lifecycle state of a harness instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarnessState {
    /// No backend client yet
    #[default]
    Unauthenticated,
    /// Backend client authenticated, nothing declared in the cluster
    Authenticated,
    /// Credential Object and SecretStore created
    Declared,
}

impl HarnessState {
    pub fn as_str(self) -> &'static str {
        match self {
            HarnessState::Unauthenticated => "Unauthenticated",
            HarnessState::Authenticated => "Authenticated",
            HarnessState::Declared => "Declared",
        }
    }
}

/// Setup and secret mutation for one backend, scoped to one test namespace
///
/// Every method reports failure as a value. Whether a failure is fatal is the
/// caller's decision.
#[async_trait]
pub trait ProviderHarness: Send + Sync {
    /// Backend name, used for logs and metrics (e.g. `azure`)
    fn name(&self) -> &str;

    /// Test namespace this instance is bound to
    fn namespace(&self) -> &str;

    fn state(&self) -> HarnessState;

    /// Reference to the declared store, for ExternalSecrets
    fn store_ref(&self) -> SecretStoreRef;

    /// Bind credentials and declare the store
    ///
    /// Must run once per instance; a second call returns
    /// [`HarnessError::AlreadyDeclared`].
    async fn setup(&mut self) -> Result<(), HarnessError>;

    /// Create or overwrite `key` in the backend; the entry exists on return
    async fn create_secret(&self, key: &str, value: &str) -> Result<(), HarnessError>;

    /// Delete `key` from the backend; an absent key is not an error
    async fn delete_secret(&self, key: &str) -> Result<(), HarnessError>;

    /// Read `key` straight from the backend
    async fn read_secret(&self, key: &str) -> Result<Option<String>, HarnessError>;
}

/// Reject empty keys and values before reaching the backend
pub(crate) fn validate_input(key: &str, value: Option<&str>) -> Result<(), HarnessError> {
    if key.trim().is_empty() {
        return Err(HarnessError::InvalidInput(
            "secret key must not be empty".to_string(),
        ));
    }
    if value.is_some_and(str::is_empty) {
        return Err(HarnessError::InvalidInput(format!(
            "value for secret {key:?} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_input() {
        assert!(validate_input("k1", Some("v1")).is_ok());
        assert!(validate_input("k1", None).is_ok());
        assert!(matches!(
            validate_input(" ", None),
            Err(HarnessError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_input("k1", Some("")),
            Err(HarnessError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default_state() {
        assert_eq!(HarnessState::default(), HarnessState::Unauthenticated);
        assert_eq!(HarnessState::Declared.as_str(), "Declared");
    }
}
