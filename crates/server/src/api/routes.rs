use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, ingest, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Ingestion job
        .route("/ingest/start/{total_pages}", post(ingest::start_ingestion))
        .route("/ingest/progress", get(ingest::get_progress))
        .route("/ingest/cancel", post(ingest::cancel_ingestion))
        // Catalog
        .route("/catalog", delete(catalog::clear_catalog))
        .route("/catalog/stats", get(catalog::get_stats))
        .route("/catalog/by-ids", get(catalog::get_by_ids))
        .route("/catalog/{id}", get(catalog::get_entry));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
