//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090,
//! `METRICS_PORT=0` disables it).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `unit_proxy_requests_total` - Unit queries handled (label: outcome)
//! - `unit_proxy_cache_hits_total` - Fresh cache hits served without upstream
//! - `unit_proxy_cache_fallbacks_total` - Cached payloads served because upstream failed
//! - `unit_proxy_upstream_failures_total` - Upstream transport or non-2xx failures
//!
//! ## Histograms
//! - `unit_proxy_upstream_duration_seconds` - Upstream round-trip duration

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "unit_proxy_requests_total";
    pub const CACHE_HITS_TOTAL: &str = "unit_proxy_cache_hits_total";
    pub const CACHE_FALLBACKS_TOTAL: &str = "unit_proxy_cache_fallbacks_total";
    pub const UPSTREAM_FAILURES_TOTAL: &str = "unit_proxy_upstream_failures_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "unit_proxy_upstream_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener
/// on the specified address.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(names::REQUESTS_TOTAL, "Total unit queries handled");
    describe_counter!(
        names::CACHE_HITS_TOTAL,
        "Fresh cache hits served without contacting upstream"
    );
    describe_counter!(
        names::CACHE_FALLBACKS_TOTAL,
        "Cached payloads served because the upstream call failed"
    );
    describe_counter!(
        names::UPSTREAM_FAILURES_TOTAL,
        "Upstream transport failures and non-2xx responses"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream round-trip duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Record one handled request with its outcome label
/// (`ok`, `cache_hit`, `cache_fallback`, `error`).
pub fn record_request(outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a fresh cache hit.
pub fn record_cache_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

/// Record a stale/fresh cache entry served as an upstream-failure fallback.
pub fn record_cache_fallback() {
    counter!(names::CACHE_FALLBACKS_TOTAL).increment(1);
}

/// Record an upstream failure (transport error or non-2xx status).
pub fn record_upstream_failure(kind: &'static str) {
    counter!(names::UPSTREAM_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record the duration of one upstream round trip.
pub fn record_upstream_duration(seconds: f64) {
    histogram!(names::UPSTREAM_DURATION_SECONDS).record(seconds);
}
