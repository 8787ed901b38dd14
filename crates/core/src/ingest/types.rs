//! Types for the ingestion job.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::CatalogSourceError;
use crate::store::StoreError;
use crate::web::FetchError;

/// Lifecycle state of the ingestion job.
///
/// `idle -> starting -> processing -> {completed, cancelled, failed}`. Every
/// terminal state accepts a new `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    #[default]
    Idle,
    Starting,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl IngestionStatus {
    /// Whether a run is scheduled or executing.
    pub fn is_active(&self) -> bool {
        matches!(self, IngestionStatus::Starting | IngestionStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Idle => "idle",
            IngestionStatus::Starting => "starting",
            IngestionStatus::Processing => "processing",
            IngestionStatus::Completed => "completed",
            IngestionStatus::Cancelled => "cancelled",
            IngestionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the ingestion job, as returned by `progress()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub status: IngestionStatus,
    /// Zero-based index of the page being processed.
    pub current_page: u32,
    /// Requested number of pages for the current run.
    pub total_pages: u32,
    pub cancel_requested: bool,
    /// Id of the current (or last) run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    /// Entries committed by the current run.
    pub works_stored: u64,
    /// Error that ended the run in `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Errors from the ingestion job.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A run is already scheduled or executing.
    #[error("ingestion already running (status: {status})")]
    AlreadyRunning { status: IngestionStatus },

    /// `start` was called with zero pages.
    #[error("total_pages must be at least 1")]
    InvalidPageCount,

    /// Listing page could not be fetched or parsed.
    #[error("catalog listing error: {0}")]
    Listing(#[from] CatalogSourceError),

    /// Detail page could not be fetched.
    #[error("detail page error: {0}")]
    Fetch(#[from] FetchError),

    /// Entry could not be committed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
