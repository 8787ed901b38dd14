//! Bulk catalog ingestion.
//!
//! The controller owns a small state machine shared with API callers:
//! - **start**: schedules one background run and returns immediately
//! - **progress**: snapshot of status, page counters and run details
//! - **cancel**: cooperative; the in-flight work is always committed first

mod config;
mod controller;
mod types;

pub use config::IngestConfig;
pub use controller::{IngestPipeline, IngestionController};
pub use types::{IngestError, IngestionStatus, JobProgress};
