//! Testing utilities and mock implementations.
//!
//! This module provides in-memory doubles for every external seam of the
//! ingestion pipeline (listing endpoint, HTTP pages, enrichment), allowing
//! end-to-end runs of the controller without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use partitura_core::testing::{fixtures, MockPageFetcher, MockWebClient};
//!
//! let pages = MockPageFetcher::new();
//! pages.add_page(0, vec![fixtures::work_ref(0, "https://imslp.org/wiki/A")]).await;
//!
//! let web = MockWebClient::new();
//! web.add_page("https://imslp.org/wiki/A", &fixtures::detail_page(&[("Key", "C minor")], &[])).await;
//! ```

mod mock_enricher;
mod mock_page_fetcher;
mod mock_web_client;

pub use mock_enricher::MockEnricher;
pub use mock_page_fetcher::MockPageFetcher;
pub use mock_web_client::{MockWebClient, RecordedRequest};

use std::sync::Arc;

use tokio::sync::Semaphore;

/// Holds mock calls until the test releases them, one permit per call.
#[derive(Debug, Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    pub(crate) fn closed() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Allow `n` more held calls to proceed.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Wait for a permit and consume it.
    pub(crate) async fn pass(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::ExternalWorkRef;
    use crate::store::WorkId;

    /// A listing reference with inline fallbacks derived from the id.
    pub fn work_ref(id: WorkId, permalink: &str) -> ExternalWorkRef {
        ExternalWorkRef {
            id,
            permalink: permalink.to_string(),
            fallback_title: format!("Work {}", id),
            fallback_composer: format!("Composer {}", id),
        }
    }

    /// A detail page with a "General Information" table and edition links.
    pub fn detail_page(rows: &[(&str, &str)], edition_links: &[&str]) -> String {
        let rows: String = rows
            .iter()
            .map(|(label, value)| format!("<tr><th>{}</th><td>{}</td></tr>", label, value))
            .collect();
        let links: String = edition_links
            .iter()
            .map(|href| format!("<a href=\"{}\">Download</a>", href))
            .collect();

        format!(
            r#"<html><body>
<h2><span class="mw-headline" id="General_Information">General Information</span></h2>
<table class="wi_body">{}</table>
<div id="wpscore_tabs">{}</div>
</body></html>"#,
            rows, links
        )
    }

    /// A landing page exposing the direct-download marker.
    pub fn marker_landing(asset_url: &str) -> String {
        format!(
            r#"<html><body><span id="sm_dl_wait" data-id="{}">Please wait...</span></body></html>"#,
            asset_url
        )
    }
}
