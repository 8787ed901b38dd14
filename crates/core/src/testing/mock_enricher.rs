//! Mock enricher for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::enrich::RecordEnricher;
use crate::store::{CatalogEntry, WorkFields};

/// Mock implementation of the RecordEnricher trait.
///
/// Returns the entry's attributes with every non-empty value of the
/// configured patch applied on top. A failing enricher returns the input
/// unchanged, which is exactly what an absorbed collaborator failure looks
/// like to the caller.
#[derive(Debug, Default)]
pub struct MockEnricher {
    patch: WorkFields,
    calls: AtomicUsize,
}

impl MockEnricher {
    /// Enricher that returns the input unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enricher that answers with the non-empty values of `patch`.
    pub fn returning(patch: WorkFields) -> Self {
        Self {
            patch,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of enrich calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordEnricher for MockEnricher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn enrich(&self, entry: &CatalogEntry) -> WorkFields {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut fields = entry.fields.clone();
        for ((_, slot), value) in fields.fields_mut().into_iter().zip(self.patch.values()) {
            if !value.is_empty() {
                *slot = value.to_string();
            }
        }
        fields
    }
}
