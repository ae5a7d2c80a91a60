//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs and acquisition (tool results, durations)
//! - Delivery (sends by kind, escalation stages)
//! - Interactive callbacks and store evictions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs & Acquisition
// =============================================================================

/// Jobs created from inbound links.
pub static JOBS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediafetch_jobs_created_total", "Total jobs created").unwrap()
});

/// Acquisition attempts by tool and outcome.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediafetch_acquisition_attempts_total",
            "Extraction tool attempts",
        ),
        &["tool", "outcome"], // "success", "partial", "not_found", "timeout", "failed"
    )
    .unwrap()
});

/// Whole acquisition duration in seconds.
pub static ACQUISITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediafetch_acquisition_duration_seconds",
            "Duration of the acquisition chain",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Delivery
// =============================================================================

/// Deliveries by media kind and result.
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_deliveries_total", "Delivery attempts"),
        &["kind", "result"],
    )
    .unwrap()
});

/// Escalation steps taken after a rejected send.
pub static ESCALATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediafetch_escalations_total",
            "Delivery escalation steps",
        ),
        &["stage"], // "recompress", "alternate"
    )
    .unwrap()
});

/// Transcode duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediafetch_conversion_duration_seconds",
            "Duration of transcoder invocations",
        )
        .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 900.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Dispatch & Store
// =============================================================================

/// Callbacks handled by tag and result.
pub static CALLBACKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_callbacks_total", "Interactive callbacks handled"),
        &["tag", "result"], // "ok", "expired", "invalid", "error"
    )
    .unwrap()
});

/// Store entries evicted by store and reason.
pub static STORE_EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediafetch_store_evictions_total", "Evicted store entries"),
        &["store", "reason"], // "capacity", "ttl"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_CREATED.clone()),
        Box::new(ACQUISITION_ATTEMPTS.clone()),
        Box::new(ACQUISITION_DURATION.clone()),
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(ESCALATIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CALLBACKS_TOTAL.clone()),
        Box::new(STORE_EVICTIONS.clone()),
    ]
}
