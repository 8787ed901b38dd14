use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partitura_core::{
    create_enricher, load_config, validate_config, AssetResolver, CatalogStore, HttpPageFetcher,
    IngestPipeline, IngestionController, PageFetcher, ReqwestWebClient, SqliteCatalogStore,
    WebClient,
};
use partitura_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PARTITURA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);
    info!("Listing endpoint: {}", config.catalog.listing_url);

    // Create SQLite catalog store
    let store: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalogStore::new(&config.database.path)
            .context("Failed to create catalog store")?,
    );
    info!("Catalog store initialized");

    // Remote clients
    let pages: Arc<dyn PageFetcher> = Arc::new(
        HttpPageFetcher::new(
            config.catalog.listing_url.clone(),
            &config.catalog.user_agent,
            config.catalog.timeout(),
        )
        .context("Failed to create listing client")?,
    );
    let web: Arc<dyn WebClient> = Arc::new(
        ReqwestWebClient::new(&config.catalog.user_agent, config.catalog.timeout())
            .context("Failed to create HTTP client")?,
    );
    let assets = AssetResolver::new(Arc::clone(&web), config.catalog.resolver_settings())
        .context("Failed to create asset resolver")?;

    // Enrichment
    let enricher = create_enricher(&config.enrichment).context("Failed to create enricher")?;
    info!(
        "Using enricher: {} (overwrite: {:?})",
        enricher.name(),
        config.enrichment.overwrite
    );

    // Ingestion controller
    let pipeline = IngestPipeline::new(
        config.ingest.clone(),
        pages,
        web,
        assets,
        enricher,
        Arc::clone(&store),
    )
    .with_overwrite_policy(config.enrichment.overwrite);
    let ingestion = Arc::new(IngestionController::new(pipeline));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::clone(&ingestion),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let a running job reach its next work boundary
    info!("Server shutting down, stopping ingestion...");
    ingestion.shutdown().await;
    info!("Ingestion stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
