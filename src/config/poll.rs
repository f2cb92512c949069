//! # Poll Configuration
//!
//! Convergence polling settings loaded from environment variables.

use super::var_or_default;
use crate::constants::{DEFAULT_CONVERGENCE_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS};
use std::time::Duration;

/// Interval between cluster polls (milliseconds)
pub const ENV_POLL_INTERVAL_MS: &str = "E2E_POLL_INTERVAL_MS";
/// Upper bound for convergence (seconds)
pub const ENV_CONVERGENCE_TIMEOUT_SECS: &str = "E2E_CONVERGENCE_TIMEOUT_SECS";

/// How the convergence suite polls cluster state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between two reads of the mirrored object
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_CONVERGENCE_TIMEOUT_SECS),
        }
    }
}

impl PollSettings {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            interval: Duration::from_millis(var_or_default(
                lookup,
                ENV_POLL_INTERVAL_MS,
                DEFAULT_POLL_INTERVAL_MS,
            )),
            timeout: Duration::from_secs(var_or_default(
                lookup,
                ENV_CONVERGENCE_TIMEOUT_SECS,
                DEFAULT_CONVERGENCE_TIMEOUT_SECS,
            )),
        }
    }
}
