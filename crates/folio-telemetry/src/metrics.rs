//! Prometheus metrics for the dashboard.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on
//! duplicate metric names, which is a startup bug, and it only runs during
//! static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Refresh gate decisions.
/// Labels: outcome (active/weekend/outside_hours/market_closed/unexpected_status/error)
pub static REFRESH_DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "folio_refresh_decisions_total",
        "Total auto-refresh gate evaluations by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Upstream requests.
/// Labels: source (market_status/history/sheet), result (ok/error)
pub static UPSTREAM_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "folio_upstream_requests_total",
        "Total upstream data requests",
        &["source", "result"]
    )
    .unwrap()
});

/// Upstream request latency in milliseconds.
pub static UPSTREAM_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "folio_upstream_latency_ms",
        "Upstream request latency in milliseconds",
        &["source"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Cache lookups.
/// Labels: cache (portfolio/market_status/history), result (hit/miss)
pub static CACHE_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "folio_cache_lookups_total",
        "Total cache lookups",
        &["cache", "result"]
    )
    .unwrap()
});

/// Cache clears requested from the dashboard.
pub static CACHE_CLEARS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "folio_cache_clears_total",
        "Total manual cache clears",
        &["trigger"]
    )
    .unwrap()
});

/// Connected WebSocket clients.
pub static WS_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("folio_ws_clients", "Connected dashboard WebSocket clients").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a refresh gate decision.
    pub fn refresh_decision(outcome: &str) {
        REFRESH_DECISIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record an upstream request and its latency.
    pub fn upstream_request(source: &str, ok: bool, latency_ms: f64) {
        let result = if ok { "ok" } else { "error" };
        UPSTREAM_REQUESTS_TOTAL
            .with_label_values(&[source, result])
            .inc();
        UPSTREAM_LATENCY_MS
            .with_label_values(&[source])
            .observe(latency_ms);
    }

    pub fn cache_hit(cache: &str) {
        CACHE_LOOKUPS_TOTAL.with_label_values(&[cache, "hit"]).inc();
    }

    pub fn cache_miss(cache: &str) {
        CACHE_LOOKUPS_TOTAL.with_label_values(&[cache, "miss"]).inc();
    }

    pub fn cache_cleared(trigger: &str) {
        CACHE_CLEARS_TOTAL.with_label_values(&[trigger]).inc();
    }

    pub fn ws_client_connected() {
        WS_CLIENTS.inc();
    }

    pub fn ws_client_disconnected() {
        WS_CLIENTS.dec();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
