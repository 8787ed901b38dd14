pub mod catalog;
pub mod config;
pub mod enrich;
pub mod ingest;
pub mod metrics;
pub mod scrape;
pub mod store;
pub mod testing;
pub mod web;

pub use catalog::{
    parse_listing, CatalogSourceError, ExternalWorkRef, HttpPageFetcher, ListingPage, PageFetcher,
    PAGE_SIZE,
};
pub use config::{
    load_config, load_config_from_str, validate_config, CatalogConfig, Config, ConfigError,
    SanitizedConfig,
};
pub use enrich::{
    create_enricher, EnrichmentConfig, EnrichmentMode, LlmEnricher, NoopEnricher, OverwritePolicy,
    RecordEnricher,
};
pub use ingest::{
    IngestConfig, IngestError, IngestPipeline, IngestionController, IngestionStatus, JobProgress,
};
pub use scrape::{AssetResolver, AssetResolverSettings, AssetStrategy, MetadataExtractor};
pub use store::{
    CatalogEntry, CatalogStats, CatalogStore, SqliteCatalogStore, StoreError, WorkFields, WorkId,
    WorkMetadata,
};
pub use web::{FetchError, ReqwestWebClient, RequestCookie, WebClient};
