use std::sync::Arc;

use partitura_core::{CatalogStore, Config, IngestionController, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn CatalogStore>,
    ingestion: Arc<IngestionController>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        ingestion: Arc<IngestionController>,
    ) -> Self {
        Self {
            config,
            store,
            ingestion,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn ingestion(&self) -> &IngestionController {
        self.ingestion.as_ref()
    }
}
