//! Prometheus metrics for the ledger.
//!
//! - `ledger_operations_total{operation}` - Mutating operations attempted
//! - `ledger_operation_duration_seconds{operation}` - Round-trip latency through the writer
//! - `ledger_operation_errors_total{operation,error}` - Rejections and failures by kind
//! - `ledger_channels`, `ledger_tokens`, `ledger_profiles` - Current counts
//! - `ledger_treasury_balance` - Current treasury balance in base units (lossy above 2^53)

use crate::ledger::LedgerState;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Operations
// ========================================================================

/// Mutating operations by name (create_channel, join, withdraw, set_profile).
pub static OPERATION_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Operation latency by name.
pub static OPERATION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Operation errors by name and error code.
pub static OPERATION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// State gauges
// ========================================================================

pub static CHANNELS: OnceLock<IntGauge> = OnceLock::new();

/// Minted membership tokens.
pub static TOKENS: OnceLock<IntGauge> = OnceLock::new();

pub static PROFILES: OnceLock<IntGauge> = OnceLock::new();

pub static TREASURY_BALANCE: OnceLock<Gauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if $metric.set(m.clone()).is_ok()
                    && let Err(e) = r.register(Box::new(m))
                {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(OPERATION_COUNTER, IntCounterVec::new(Opts::new("ledger_operations_total", "Ledger operations by type"), &["operation"]));
    register!(OPERATION_LATENCY, HistogramVec::new(
        HistogramOpts::new("ledger_operation_duration_seconds", "Ledger operation latency by type")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["operation"]));
    register!(OPERATION_ERRORS, IntCounterVec::new(Opts::new("ledger_operation_errors_total", "Ledger operation errors by type"), &["operation", "error"]));
    register!(CHANNELS, IntGauge::new("ledger_channels", "Channels created"));
    register!(TOKENS, IntGauge::new("ledger_tokens", "Membership tokens minted"));
    register!(PROFILES, IntGauge::new("ledger_profiles", "Accounts with a profile"));
    register!(TREASURY_BALANCE, Gauge::new("ledger_treasury_balance", "Treasury balance in base units"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record an operation with its latency.
#[inline]
pub fn record_operation(operation: &str, duration_secs: f64) {
    if let Some(c) = OPERATION_COUNTER.get() {
        c.with_label_values(&[operation]).inc();
    }
    if let Some(h) = OPERATION_LATENCY.get() {
        h.with_label_values(&[operation]).observe(duration_secs);
    }
}

/// Record an operation error.
#[inline]
pub fn record_operation_error(operation: &str, error: &str) {
    if let Some(c) = OPERATION_ERRORS.get() {
        c.with_label_values(&[operation, error]).inc();
    }
}

/// Refresh the state gauges from a freshly published snapshot.
pub fn observe_state(state: &LedgerState) {
    if let Some(g) = CHANNELS.get() {
        g.set(state.total_channels() as i64);
    }
    if let Some(g) = TOKENS.get() {
        g.set(state.total_supply() as i64);
    }
    if let Some(g) = PROFILES.get() {
        g.set(state.profile_count() as i64);
    }
    if let Some(g) = TREASURY_BALANCE.get() {
        g.set(state.treasury().balance.get() as f64);
    }
}
