//! Telemetry utilities for operation timing and tracing spans.

use std::time::Instant;

/// Guard for timing a ledger operation and recording metrics.
///
/// Records operation latency when dropped.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    /// Start timing an operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_operation(self.operation, duration);
    }
}

/// Standardized span constructors for ledger observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one mutating operation, entered by the caller's future.
    pub fn operation(name: &'static str, account: &str) -> Span {
        info_span!("ledger_op", op = name, account = %account)
    }

    /// Span covering the writer task's lifetime.
    pub fn writer(name: &str, symbol: &str) -> Span {
        info_span!("ledger_writer", collection = %name, symbol = %symbol)
    }
}
