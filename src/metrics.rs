//! Prometheus metrics for request and query monitoring.
//!
//! This module provides:
//! - HTTP request counts and latency, labelled by method and status
//! - Database query latency and error counts, labelled by operation

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::ServiceError;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Database query latency metric name.
pub const METRIC_DB_QUERY_LATENCY: &str = "db_query_latency_ms";
/// Database errors counter metric name.
pub const METRIC_DB_ERRORS: &str = "db_errors_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after a recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_DB_QUERY_LATENCY,
        "Database query latency in milliseconds"
    );

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests");
    describe_counter!(METRIC_DB_ERRORS, "Total number of failed database queries");

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, ServiceError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServiceError::Metrics(e.to_string()))
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, status: u16, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "method" => method.to_string()).record(latency_ms);
    counter!(
        METRIC_HTTP_REQUESTS,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment the database error counter.
pub fn inc_db_errors(operation: &'static str) {
    counter!(METRIC_DB_ERRORS, "operation" => operation).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    operation: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and operation label.
    pub fn new(metric_name: &'static str, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            operation,
        }
    }

    /// Timer for a database query.
    pub fn db_query(operation: &'static str) -> Self {
        Self::new(METRIC_DB_QUERY_LATENCY, operation)
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name, "operation" => self.operation).record(self.elapsed_ms());
    }
}
