//! # Observability
//!
//! Tracing setup for test binaries and the CLI, and Prometheus metrics for
//! backend operations.

pub mod metrics;

use crate::constants::DEFAULT_LOG_FILTER;

/// Install the tracing subscriber
///
/// Safe to call from every test: only the first call installs a subscriber.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_test_writer()
        .try_init();

    if result.is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}
