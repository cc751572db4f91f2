//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define console metrics (remote calls, config writes, snapshots)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `console_remote_requests_total` (counter): control-plane calls by method, outcome
//! - `console_remote_request_duration_seconds` (histogram): control-plane latency
//! - `console_remote_healthy` (gauge): 1=reachable, 0=unreachable
//! - `console_config_writes_total` (counter): live file writes by outcome
//! - `console_snapshots_created_total` (counter)
//! - `console_admin_requests_total` (counter): admin API calls by method, status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_remote_request(method: &str, outcome: &'static str, start: Instant) {
    let method = method.to_string();
    counter!("console_remote_requests_total", "method" => method.clone(), "outcome" => outcome)
        .increment(1);
    histogram!("console_remote_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_remote_health(healthy: bool) {
    gauge!("console_remote_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_config_write(outcome: &'static str) {
    counter!("console_config_writes_total", "outcome" => outcome).increment(1);
}

pub fn record_snapshot_created() {
    counter!("console_snapshots_created_total").increment(1);
}

pub fn record_admin_request(method: &str, status: u16) {
    counter!(
        "console_admin_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
