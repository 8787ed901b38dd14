//! Best-effort completion of missing work attributes.
//!
//! An enricher never fails from the caller's point of view: on any internal
//! error it returns the attributes it was given. The controller merges what
//! comes back according to the configured [`OverwritePolicy`].

mod config;
mod llm;
mod llm_enricher;

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{CatalogEntry, WorkFields};

pub use config::{EnrichmentConfig, EnrichmentMode, LlmConfig, LlmProvider, OverwritePolicy};
pub use llm::{EnrichmentPrompt, HttpLlmClient, LlmClient, LlmError};
pub use llm_enricher::LlmEnricher;

/// Completes a partially-filled record.
#[async_trait]
pub trait RecordEnricher: Send + Sync {
    /// Enricher name (for logging).
    fn name(&self) -> &str;

    /// Return a same-shaped set of attributes for `entry`.
    async fn enrich(&self, entry: &CatalogEntry) -> WorkFields;
}

/// Enricher that changes nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopEnricher;

#[async_trait]
impl RecordEnricher for NoopEnricher {
    fn name(&self) -> &str {
        "noop"
    }

    async fn enrich(&self, entry: &CatalogEntry) -> WorkFields {
        entry.fields.clone()
    }
}

impl OverwritePolicy {
    /// Merge enriched attributes into the extracted ones.
    pub fn apply(self, extracted: WorkFields, enriched: WorkFields) -> WorkFields {
        match self {
            OverwritePolicy::Always => enriched,
            OverwritePolicy::FillMissing => {
                let mut merged = extracted;
                for ((_, slot), value) in merged.fields_mut().into_iter().zip(enriched.values()) {
                    if slot.trim().is_empty() {
                        *slot = value.to_string();
                    }
                }
                merged
            }
        }
    }
}

/// Build the enricher selected by configuration.
pub fn create_enricher(config: &EnrichmentConfig) -> Result<Arc<dyn RecordEnricher>, LlmError> {
    match config.mode {
        EnrichmentMode::Disabled => Ok(Arc::new(NoopEnricher)),
        EnrichmentMode::Llm => {
            let llm_config = config.llm.as_ref().ok_or_else(|| {
                LlmError::NotConfigured("enrichment.mode = \"llm\" requires [enrichment.llm]".into())
            })?;
            let client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::from_config(llm_config)?);
            Ok(Arc::new(LlmEnricher::new(client)))
        }
    }
}
