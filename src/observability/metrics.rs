//! Metrics collection and exposition.
//!
//! # Metrics
//! - `isp_http_requests_total` (counter): requests by method, status
//! - `isp_http_request_duration_seconds` (histogram): latency distribution
//! - `isp_circuit_transitions_total` (counter): state changes by path, target state
//! - `isp_circuit_rejections_total` (counter): requests refused by an open circuit
//! - `isp_circuit_store_fallbacks_total` (counter): shared store errors by operation
//! - `isp_webhook_deliveries_total` (counter): deliveries by event, outcome
//! - `isp_webhook_delivery_duration_seconds` (histogram): per-delivery latency
//! - `isp_webhooks_registered` (gauge): current registrations
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; a no-op until a recorder is installed
//! - Prometheus exporter serves its own listener, separate from the API

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics listener started");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "isp_http_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "isp_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_circuit_transition(path: &str, to: &'static str) {
    counter!("isp_circuit_transitions_total", "path" => path.to_string(), "to" => to).increment(1);
}

pub fn record_circuit_rejection(path: &str) {
    counter!("isp_circuit_rejections_total", "path" => path.to_string()).increment(1);
}

pub fn record_store_fallback(op: &'static str) {
    counter!("isp_circuit_store_fallbacks_total", "op" => op).increment(1);
}

pub fn record_delivery(event: &str, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    counter!("isp_webhook_deliveries_total", "event" => event.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("isp_webhook_delivery_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_webhooks_registered(count: usize) {
    gauge!("isp_webhooks_registered").set(count as f64);
}
