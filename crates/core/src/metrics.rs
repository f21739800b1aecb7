//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Indexer searches (per-indexer outcome and latency)
//! - Debrid resolution (per-service outcome, fallbacks, cache checks, token refreshes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Indexer Search Metrics
// =============================================================================

/// Indexer searches by indexer and result.
pub static INDEXER_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_indexer_searches_total", "Total indexer searches"),
        &["indexer", "result"], // "success", "failure", "timeout"
    )
    .unwrap()
});

/// Indexer search duration in seconds.
pub static INDEXER_SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relay_indexer_search_duration_seconds",
            "Duration of a single indexer search",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0]),
        &["indexer"],
    )
    .unwrap()
});

/// Results returned per aggregated search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relay_search_results",
            "Number of results per aggregated search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Debrid Metrics
// =============================================================================

/// Stream resolutions by service and result.
pub static DEBRID_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "relay_debrid_resolutions_total",
            "Total stream resolution attempts per debrid service",
        ),
        &["service", "result"], // "success", "failure"
    )
    .unwrap()
});

/// Resolution duration in seconds.
pub static DEBRID_RESOLUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relay_debrid_resolution_duration_seconds",
            "Duration of one provider resolution attempt",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service"],
    )
    .unwrap()
});

/// Times resolution moved on to the next configured provider.
pub static DEBRID_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "relay_debrid_fallbacks_total",
        "Total fallbacks to the next debrid provider",
    )
    .unwrap()
});

/// Cache availability checks by service and result.
pub static DEBRID_CACHE_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "relay_debrid_cache_checks_total",
            "Total debrid cache availability checks",
        ),
        &["service", "result"],
    )
    .unwrap()
});

/// OAuth token refreshes by service and result.
pub static TOKEN_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_token_refreshes_total", "Total access token refreshes"),
        &["service", "result"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(INDEXER_SEARCHES.clone()),
        Box::new(INDEXER_SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        // Debrid
        Box::new(DEBRID_RESOLUTIONS.clone()),
        Box::new(DEBRID_RESOLUTION_DURATION.clone()),
        Box::new(DEBRID_FALLBACKS.clone()),
        Box::new(DEBRID_CACHE_CHECKS.clone()),
        Box::new(TOKEN_REFRESHES.clone()),
    ]
}
