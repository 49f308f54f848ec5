//! Metrics collection and exposition.
//!
//! # Metrics
//! - `xhttp_requests_total` (counter): requests by mode and status
//! - `xhttp_request_duration_seconds` (histogram): latency by mode
//! - `xhttp_registry_reloads_total` (counter): registry reloads by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so handlers record unconditionally.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "xhttp_requests_total";
pub const REQUEST_DURATION: &str = "xhttp_request_duration_seconds";
pub const REGISTRY_RELOADS: &str = "xhttp_registry_reloads_total";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request and its latency.
pub fn record_request(mode: &str, status: u16, start: Instant) {
    let mode = mode.to_string();
    metrics::counter!(REQUESTS_TOTAL, "mode" => mode.clone(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION, "mode" => mode).record(start.elapsed().as_secs_f64());
}

/// Count a registry reload attempt ("success" or "failure").
pub fn record_reload(outcome: &str) {
    metrics::counter!(REGISTRY_RELOADS, "outcome" => outcome.to_string()).increment(1);
}
