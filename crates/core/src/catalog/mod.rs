//! Remote catalog listing.
//!
//! The catalog is paged by integer offset with a fixed page size. An empty
//! page is the end-of-catalog signal, not an error.

mod listing;
mod types;

pub use listing::{parse_listing, HttpPageFetcher};
pub use types::{ExternalWorkRef, ListingPage, PAGE_SIZE};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when reading the catalog listing.
#[derive(Debug, Error)]
pub enum CatalogSourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse the listing envelope.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Trait for retrieving listing pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page starting at `offset`.
    ///
    /// Returns an empty page once the catalog is exhausted. Transport and
    /// protocol failures are returned as errors.
    async fn fetch_page(&self, offset: u64) -> Result<ListingPage, CatalogSourceError>;
}
