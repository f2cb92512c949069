//! # Harness Error Types
//!
//! Errors surfaced by provider harnesses, classified by the lifecycle phase
//! they occur in so the calling test can decide what is fatal.

use crate::cluster::ClusterError;
use thiserror::Error;

/// Error returned by harness construction, setup and secret operations
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Required configuration is missing or malformed
    #[error("invalid harness configuration: {0}")]
    Config(String),

    /// The backend rejected the credential or could not be reached
    #[error("authentication against {endpoint} failed: {message}")]
    Authentication { endpoint: String, message: String },

    /// Creating the Credential Object or the SecretStore failed
    #[error("setup in namespace {namespace} failed: {source}")]
    Setup {
        namespace: String,
        #[source]
        source: ClusterError,
    },

    /// `setup` was called a second time on the same harness instance
    #[error("harness for namespace {namespace} has already declared its store")]
    AlreadyDeclared { namespace: String },

    /// The backend rejected a create, read or delete
    #[error("{operation} of secret {key:?} failed: {message}")]
    Operation {
        operation: &'static str,
        key: String,
        message: String,
    },

    /// Empty key or value passed to a secret operation
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Lifecycle phase an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Harness construction; aborts every test of the backend
    Construction,
    /// Per-test setup; fails the current test
    Setup,
    /// Secret operation; fails the current test
    Operation,
}

impl ErrorPhase {
    /// Get phase name for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorPhase::Construction => "construction",
            ErrorPhase::Setup => "setup",
            ErrorPhase::Operation => "operation",
        }
    }
}

impl HarnessError {
    pub(crate) fn operation(operation: &'static str, key: &str, error: &anyhow::Error) -> Self {
        HarnessError::Operation {
            operation,
            key: key.to_string(),
            message: format!("{error:#}"),
        }
    }

    pub(crate) fn authentication(endpoint: &str, error: &anyhow::Error) -> Self {
        HarnessError::Authentication {
            endpoint: endpoint.to_string(),
            message: format!("{error:#}"),
        }
    }

    /// Phase this error was raised in
    pub fn phase(&self) -> ErrorPhase {
        match self {
            HarnessError::Config(_) | HarnessError::Authentication { .. } => {
                ErrorPhase::Construction
            }
            HarnessError::Setup { .. } | HarnessError::AlreadyDeclared { .. } => ErrorPhase::Setup,
            HarnessError::Operation { .. } | HarnessError::InvalidInput(_) => {
                ErrorPhase::Operation
            }
        }
    }

    /// Construction errors mean no test of this backend can run
    pub fn is_fatal_to_suite(&self) -> bool {
        self.phase() == ErrorPhase::Construction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_errors_abort_the_suite() {
        let err = HarnessError::Authentication {
            endpoint: "https://kv.vault.azure.net/".to_string(),
            message: "AADSTS7000215: Invalid client secret".to_string(),
        };
        assert_eq!(err.phase(), ErrorPhase::Construction);
        assert!(err.is_fatal_to_suite());
        assert!(HarnessError::Config("missing".to_string()).is_fatal_to_suite());
    }

    #[test]
    fn test_setup_and_operation_errors_fail_only_the_test() {
        let setup = HarnessError::AlreadyDeclared {
            namespace: "e2e-1".to_string(),
        };
        assert_eq!(setup.phase(), ErrorPhase::Setup);
        assert!(!setup.is_fatal_to_suite());

        let op = HarnessError::Operation {
            operation: "create",
            key: "k1".to_string(),
            message: "HTTP 403".to_string(),
        };
        assert_eq!(op.phase(), ErrorPhase::Operation);
        assert_eq!(op.phase().as_str(), "operation");
        assert!(op.to_string().contains("\"k1\""));
    }

    #[test]
    fn test_operation_keeps_error_chain() {
        let inner = anyhow::anyhow!("HTTP 409").context("set_secret rejected");
        let err = HarnessError::operation("create", "k1", &inner);
        let text = err.to_string();
        assert!(text.contains("set_secret rejected"));
        assert!(text.contains("HTTP 409"));
    }
}
