//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process with
//! mock listing and web clients injected, so the ingestion job can be driven
//! end to end without network access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use partitura_core::{
    testing::{MockPageFetcher, MockWebClient},
    AssetResolver, CatalogStore, Config, IngestConfig, IngestPipeline, IngestionController,
    NoopEnricher, PageFetcher, SqliteCatalogStore, WebClient, WorkId,
};
use partitura_core::scrape::{LABEL_COMPOSER, LABEL_TITLE};

/// Re-export fixtures for test convenience
pub use partitura_core::testing::fixtures;

/// Test fixture with an in-process router and controllable remote doubles.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.post("/api/v1/ingest/start/1").await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock listing source - configure pages by offset
    pub pages: Arc<MockPageFetcher>,
    /// Mock web client - configure detail and landing pages
    pub web: Arc<MockWebClient>,
    /// The catalog store behind the router
    pub store: Arc<SqliteCatalogStore>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test fixture after letting `customize` adjust the config.
    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.database.path = db_path.clone();
        config.ingest = IngestConfig {
            backoff_min_ms: 0,
            backoff_max_ms: 0,
            skip_metadata: false,
        };
        customize(&mut config);

        let pages = Arc::new(MockPageFetcher::new());
        let web = Arc::new(MockWebClient::new());
        let store = Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to create store"));

        let assets = AssetResolver::new(
            Arc::clone(&web) as Arc<dyn WebClient>,
            config.catalog.resolver_settings(),
        )
        .expect("Failed to create asset resolver");

        let pipeline = IngestPipeline::new(
            config.ingest.clone(),
            Arc::clone(&pages) as Arc<dyn PageFetcher>,
            Arc::clone(&web) as Arc<dyn WebClient>,
            assets,
            Arc::new(NoopEnricher),
            Arc::clone(&store) as Arc<dyn CatalogStore>,
        )
        .with_overwrite_policy(config.enrichment.overwrite);
        let ingestion = Arc::new(IngestionController::new(pipeline));

        let state = Arc::new(partitura_server::state::AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            ingestion,
        ));

        let router = partitura_server::api::create_router(state);

        Self {
            router,
            pages,
            web,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    /// Send a request and return the status with the JSON body (or `Null`).
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };

        TestResponse { status, body }
    }

    /// Poll the progress endpoint until the job leaves its active states.
    pub async fn wait_for_idle(&self) -> TestResponse {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let response = self.get("/api/v1/ingest/progress").await;
            let status = response.body["status"].as_str().unwrap_or_default().to_string();
            if status != "starting" && status != "processing" {
                return response;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("Ingestion did not finish in time: {}", response.body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Serve `works` as the listing page at `offset`, each with a detail page
    /// carrying its title and composer.
    pub async fn add_listing_page(&self, offset: u64, works: &[(WorkId, &str, &str)]) {
        let mut refs = Vec::with_capacity(works.len());
        for (id, title, composer) in works {
            let permalink = format!("https://imslp.org/wiki/Work_{}", id);
            let rows = [(LABEL_TITLE, *title), (LABEL_COMPOSER, *composer)];
            self.web
                .add_page(&permalink, &fixtures::detail_page(&rows, &[]))
                .await;
            refs.push(fixtures::work_ref(*id, &permalink));
        }
        self.pages.add_page(offset, refs).await;
    }
}

/// Assert response status with helpful error message.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {
        assert_eq!(
            $response.status,
            $expected,
            "Expected status {}, got {}. Body: {:?}",
            $expected,
            $response.status,
            $response.body
        );
    };
}
