//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hot_config_reloads_total` (counter): live reloads by action
//! - `hot_config_load_failures_total` (counter): files that failed to load
//! - `hot_config_entries` (gauge): configs currently in the store
//! - `hot_config_restart_requests_total` (counter): restart requests by reason
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(action: &'static str) {
    metrics::counter!("hot_config_reloads_total", "action" => action).increment(1);
}

pub fn record_load_failure() {
    metrics::counter!("hot_config_load_failures_total").increment(1);
}

pub fn record_entries(count: usize) {
    metrics::gauge!("hot_config_entries").set(count as f64);
}

pub fn record_restart_request(reason: &'static str) {
    metrics::counter!("hot_config_restart_requests_total", "reason" => reason).increment(1);
}
