//! # Vault Operation Metrics
//!
//! Counters and latency histograms for harness operations, labelled by
//! provider and operation.

use anyhow::Result;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Instant;

/// Prometheus registry for harness metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "secret_store_e2e_vault_operations_total",
            "Total number of direct backend operations",
        ),
        &["provider", "operation"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "secret_store_e2e_vault_operation_errors_total",
            "Total number of failed direct backend operations",
        ),
        &["provider", "operation"],
    )
    .expect("Failed to create VAULT_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "secret_store_e2e_vault_operation_duration_seconds",
            "Duration of direct backend operations in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["provider", "operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

/// Register harness metrics with the registry
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(VAULT_OPERATIONS_TOTAL.clone()),
        Box::new(VAULT_OPERATION_ERRORS_TOTAL.clone()),
        Box::new(VAULT_OPERATION_DURATION.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub fn record_vault_operation(provider: &str, operation: &str, duration_secs: f64) {
    VAULT_OPERATIONS_TOTAL
        .with_label_values(&[provider, operation])
        .inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[provider, operation])
        .observe(duration_secs);
}

pub fn increment_vault_operation_errors(provider: &str, operation: &str) {
    VAULT_OPERATION_ERRORS_TOTAL
        .with_label_values(&[provider, operation])
        .inc();
}

/// Record an operation that started at `start`; counted as an error unless `ok`
pub fn observe_vault_operation(provider: &str, operation: &str, start: Instant, ok: bool) {
    record_vault_operation(provider, operation, start.elapsed().as_secs_f64());
    if !ok {
        increment_vault_operation_errors(provider, operation);
    }
}

/// Current operation count, for assertions
pub fn vault_operations_total(provider: &str, operation: &str) -> u64 {
    VAULT_OPERATIONS_TOTAL
        .with_label_values(&[provider, operation])
        .get()
}

/// Current error count, for assertions
pub fn vault_operation_errors_total(provider: &str, operation: &str) -> u64 {
    VAULT_OPERATION_ERRORS_TOTAL
        .with_label_values(&[provider, operation])
        .get()
}

/// Render registered metrics in the Prometheus text format
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
