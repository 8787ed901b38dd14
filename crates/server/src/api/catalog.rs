//! Catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use partitura_core::{CatalogEntry, CatalogStats, StoreError, WorkId};
use serde::{Deserialize, Serialize};

use super::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ByIdsParams {
    /// JSON array of work ids, e.g. `[1,2,3]`.
    pub ids: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub entries: Vec<CatalogEntry>,
    pub total: usize,
}

fn internal_error(e: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog/stats
///
/// Work and composer counts.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogStats>, impl IntoResponse> {
    state.store().stats().map(Json).map_err(internal_error)
}

/// DELETE /api/v1/catalog
///
/// Remove every stored work.
pub async fn clear_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, impl IntoResponse> {
    match state.store().clear() {
        Ok(()) => {
            tracing::info!("Catalog cleared");
            Ok(Json(SuccessResponse {
                message: "Catalog cleared".to_string(),
            }))
        }
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/v1/catalog/by-ids?ids=[1,2,3]
///
/// Entries for the given ids, ordered by id. Unknown ids are skipped.
pub async fn get_by_ids(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdsParams>,
) -> Result<Json<CatalogListResponse>, impl IntoResponse> {
    let ids: Vec<WorkId> = serde_json::from_str(&params.ids).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("ids must be a JSON array of integers: {}", e),
            }),
        )
    })?;

    match state.store().get_many(&ids) {
        Ok(entries) => {
            let total = entries.len();
            Ok(Json(CatalogListResponse { entries, total }))
        }
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/v1/catalog/{id}
///
/// Get a single work by external id.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorkId>,
) -> Result<Json<CatalogEntry>, impl IntoResponse> {
    match state.store().get(id) {
        Ok(entry) => Ok(Json(entry)),
        Err(StoreError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Work not found: {}", id),
            }),
        )),
        Err(e) => Err(internal_error(e)),
    }
}
