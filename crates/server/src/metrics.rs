//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the bot server:
//! - HTTP request metrics for the health/metrics surface
//! - Update handling by kind
//! - Live jobs and item tokens (collected dynamically)
//!
//! Engine metrics from the core crate are registered in the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediafetch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediafetch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Chat Update Metrics
// =============================================================================

/// Updates received from the chat platform.
pub static UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_updates_total", "Chat updates received"),
        &["kind"], // "message", "callback"
    )
    .unwrap()
});

/// Updates whose handler returned an error.
pub static UPDATE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_update_errors_total", "Chat updates that failed"),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Store Metrics (collected dynamically)
// =============================================================================

/// Jobs currently held in memory.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediafetch_jobs_active", "Jobs currently held in memory").unwrap()
});

/// Item tokens currently held in memory.
pub static TOKENS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediafetch_tokens_active",
        "Item tokens currently held in memory",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Updates
    registry.register(Box::new(UPDATES_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(UPDATE_ERRORS_TOTAL.clone()))
        .unwrap();

    // Stores
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(TOKENS_ACTIVE.clone())).unwrap();

    // Core metrics (acquisition, delivery, callbacks, evictions)
    for metric in mediafetch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Updates gauges from the current store contents.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    JOBS_ACTIVE.set(state.jobs().len().await as i64);
    TOKENS_ACTIVE.set(state.tokens().len().await as i64);
}
