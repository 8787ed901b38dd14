//! Mock listing source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Gate;
use crate::catalog::{CatalogSourceError, ExternalWorkRef, ListingPage, PageFetcher};

/// Mock implementation of the PageFetcher trait.
///
/// Pages are keyed by offset; any offset without a configured page returns
/// an empty page (end of catalog).
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = MockPageFetcher::new();
/// fetcher.add_page(0, vec![fixtures::work_ref(0, "https://imslp.org/wiki/A")]).await;
/// fetcher.fail_at(1000, "upstream down").await;
///
/// let gate = fetcher.gate();
/// // ... start ingestion; every fetch now waits for a permit ...
/// gate.release(1);
/// ```
#[derive(Default)]
pub struct MockPageFetcher {
    pages: Arc<RwLock<HashMap<u64, Vec<ExternalWorkRef>>>>,
    failures: Arc<RwLock<HashMap<u64, String>>>,
    requested: Arc<RwLock<Vec<u64>>>,
    gate: std::sync::Mutex<Option<Gate>>,
}

impl MockPageFetcher {
    /// Create a fetcher with no pages (the catalog is empty).
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `works` for the page starting at `offset`, in the given order.
    pub async fn add_page(&self, offset: u64, works: Vec<ExternalWorkRef>) {
        self.pages.write().await.insert(offset, works);
    }

    /// Fail the page at `offset` with an API error.
    pub async fn fail_at(&self, offset: u64, message: &str) {
        self.failures
            .write()
            .await
            .insert(offset, message.to_string());
    }

    /// Block every subsequent fetch until the returned gate releases it.
    pub fn gate(&self) -> Gate {
        let gate = Gate::closed();
        if let Ok(mut slot) = self.gate.lock() {
            *slot = Some(gate.clone());
        }
        gate
    }

    /// Offsets requested so far, in order.
    pub async fn requested_offsets(&self) -> Vec<u64> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_page(&self, offset: u64) -> Result<ListingPage, CatalogSourceError> {
        let gate = self.gate.lock().ok().and_then(|g| g.clone());
        if let Some(gate) = gate {
            gate.pass().await;
        }

        self.requested.write().await.push(offset);

        if let Some(message) = self.failures.read().await.get(&offset) {
            return Err(CatalogSourceError::ApiError {
                status: 503,
                message: message.clone(),
            });
        }

        let works = self.pages.read().await.get(&offset).cloned().unwrap_or_default();
        Ok(works
            .into_iter()
            .enumerate()
            .map(|(index, work)| (index as u32, work))
            .collect())
    }
}
