//! Ingestion job API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use partitura_core::{IngestError, JobProgress};
use serde::Serialize;

use super::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: String,
    pub run_id: String,
}

/// POST /api/v1/ingest/start/{total_pages}
///
/// Schedule an ingestion run over `total_pages` listing pages.
pub async fn start_ingestion(
    State(state): State<Arc<AppState>>,
    Path(total_pages): Path<u32>,
) -> Result<(StatusCode, Json<StartResponse>), impl IntoResponse> {
    match state.ingestion().start(total_pages).await {
        Ok(run_id) => Ok((
            StatusCode::ACCEPTED,
            Json(StartResponse {
                message: "Task started successfully!".to_string(),
                run_id: run_id.to_string(),
            }),
        )),
        Err(e @ IngestError::AlreadyRunning { .. }) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e @ IngestError::InvalidPageCount) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/ingest/progress
///
/// Snapshot of the ingestion job.
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<JobProgress> {
    Json(state.ingestion().progress().await)
}

/// POST /api/v1/ingest/cancel
///
/// Request cancellation; the job stops after its in-flight work is stored.
pub async fn cancel_ingestion(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SuccessResponse>) {
    state.ingestion().cancel();
    (
        StatusCode::ACCEPTED,
        Json(SuccessResponse {
            message: "Cancellation requested".to_string(),
        }),
    )
}
