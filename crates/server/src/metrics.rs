//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Partitura server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Catalog size and ingestion job state (collected dynamically)
//! - Core pipeline metrics (registered from `partitura_core::metrics`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

use partitura_core::IngestionStatus;

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
            "partitura_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("partitura_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "partitura_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Catalog / Ingestion Metrics (collected dynamically)
// =============================================================================

/// Stored works.
pub static CATALOG_WORKS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("partitura_catalog_works", "Number of works in the catalog").unwrap()
});

/// Ingestion job status (1 for the current status, 0 otherwise).
pub static INGEST_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("partitura_ingest_status", "Current ingestion job status"),
        &["status"],
    )
    .unwrap()
});

/// Page index of the running (or last) ingestion job.
pub static INGEST_CURRENT_PAGE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "partitura_ingest_current_page",
        "Listing page index of the current ingestion run",
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

    // Catalog / ingestion
    registry.register(Box::new(CATALOG_WORKS.clone())).unwrap();
    registry.register(Box::new(INGEST_STATUS.clone())).unwrap();
    registry
        .register(Box::new(INGEST_CURRENT_PAGE.clone()))
        .unwrap();

    // Core metrics (pages, works, assets, enrichment)
    for metric in partitura_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the store and the job right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.store().count() {
        Ok(count) => CATALOG_WORKS.set(count as i64),
        Err(e) => warn!("Failed to count catalog works: {}", e),
    }

    let progress = state.ingestion().progress().await;
    for status in [
        IngestionStatus::Idle,
        IngestionStatus::Starting,
        IngestionStatus::Processing,
        IngestionStatus::Completed,
        IngestionStatus::Cancelled,
        IngestionStatus::Failed,
    ] {
        INGEST_STATUS
            .with_label_values(&[status.as_str()])
            .set(i64::from(status == progress.status));
    }
    INGEST_CURRENT_PAGE.set(i64::from(progress.current_page));
}

/// Replace numeric path segments with `{id}` to keep label cardinality bounded.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
