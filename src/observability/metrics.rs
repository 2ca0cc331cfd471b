//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, outcome
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_resolutions_total` (counter): directory lookups by outcome
//! - `proxy_pipelines_constructed_total` (counter): pipelines built
//! - `proxy_pipeline_cache_size` (gauge): cached identifiers

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(outcome: &'static str) {
    counter!("proxy_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_pipeline_constructed(cache_size: usize) {
    counter!("proxy_pipelines_constructed_total").increment(1);
    gauge!("proxy_pipeline_cache_size").set(cache_size as f64);
}
