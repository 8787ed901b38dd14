//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Listing pagination and stored works
//! - Asset resolution (per strategy) and discarded landing candidates
//! - Enrichment outcomes
//! - Ingestion runs and per-work processing time

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ingestion
// =============================================================================

/// Listing pages fetched.
pub static PAGES_FETCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("partitura_pages_fetched_total", "Listing pages fetched"),
        &["result"], // "items", "empty", "error"
    )
    .unwrap()
});

/// Works committed to the catalog store.
pub static WORKS_STORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "partitura_works_stored_total",
        "Works upserted into the catalog",
    )
    .unwrap()
});

/// Ingestion runs by terminal status.
pub static INGEST_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("partitura_ingest_runs_total", "Ingestion runs by final status"),
        &["status"], // "completed", "cancelled", "failed"
    )
    .unwrap()
});

/// Time spent on one work (detail fetch through commit).
pub static WORK_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "partitura_work_duration_seconds",
            "Processing time per work, detail fetch through store commit",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

// =============================================================================
// Scraping
// =============================================================================

/// Asset URLs resolved, by the strategy that produced them.
pub static ASSETS_RESOLVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("partitura_assets_resolved_total", "Asset URLs resolved"),
        &["strategy"],
    )
    .unwrap()
});

/// Landing candidates no strategy accepted (or that could not be fetched).
pub static LANDING_CANDIDATES_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "partitura_landing_candidates_discarded_total",
        "Landing candidates discarded during asset resolution",
    )
    .unwrap()
});

// =============================================================================
// Enrichment
// =============================================================================

/// Enrichment calls by outcome.
pub static ENRICHMENT_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("partitura_enrichment_results_total", "Enrichment calls by outcome"),
        &["outcome"], // "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PAGES_FETCHED.clone()),
        Box::new(WORKS_STORED.clone()),
        Box::new(INGEST_RUNS.clone()),
        Box::new(WORK_DURATION.clone()),
        Box::new(ASSETS_RESOLVED.clone()),
        Box::new(LANDING_CANDIDATES_DISCARDED.clone()),
        Box::new(ENRICHMENT_RESULTS.clone()),
    ]
}
