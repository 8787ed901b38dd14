//! End-to-end runs of the ingestion controller against in-memory doubles and
//! a SQLite file.

use std::sync::Arc;
use std::time::Duration;

use partitura_core::config::CatalogConfig;
use partitura_core::enrich::{OverwritePolicy, RecordEnricher};
use partitura_core::ingest::{
    IngestConfig, IngestError, IngestPipeline, IngestionController, IngestionStatus,
};
use partitura_core::scrape::{AssetResolver, LABEL_COMPOSER, LABEL_KEY, LABEL_TITLE};
use partitura_core::store::{CatalogStore, SqliteCatalogStore, WorkFields};
use partitura_core::testing::{fixtures, MockEnricher, MockPageFetcher, MockWebClient};
use partitura_core::web::WebClient;
use tempfile::TempDir;

struct Harness {
    pages: Arc<MockPageFetcher>,
    web: Arc<MockWebClient>,
    enricher: Arc<MockEnricher>,
    store: Arc<SqliteCatalogStore>,
    controller: IngestionController,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::with(MockEnricher::new(), OverwritePolicy::Always, false)
    }

    fn with(enricher: MockEnricher, overwrite: OverwritePolicy, skip_metadata: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCatalogStore::new(&dir.path().join("catalog.db")).unwrap());
        let pages = Arc::new(MockPageFetcher::new());
        let web = Arc::new(MockWebClient::new());
        let enricher = Arc::new(enricher);

        let assets = AssetResolver::new(
            Arc::clone(&web) as Arc<dyn WebClient>,
            CatalogConfig::default().resolver_settings(),
        )
        .unwrap();

        let config = IngestConfig {
            backoff_min_ms: 0,
            backoff_max_ms: 0,
            skip_metadata,
        };

        let pipeline = IngestPipeline::new(
            config,
            pages.clone(),
            web.clone(),
            assets,
            Arc::clone(&enricher) as Arc<dyn RecordEnricher>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
        )
        .with_overwrite_policy(overwrite);

        Self {
            pages,
            web,
            enricher,
            store,
            controller: IngestionController::new(pipeline),
            _dir: dir,
        }
    }

    /// Register a listed work with a detail page carrying `rows`.
    async fn add_work(&self, permalink: &str, rows: &[(&str, &str)], edition_links: &[&str]) {
        self.web
            .add_page(permalink, &fixtures::detail_page(rows, edition_links))
            .await;
    }

    async fn run(&self, total_pages: u32) -> IngestionStatus {
        self.controller.start(total_pages).await.unwrap();
        tokio::time::timeout(Duration::from_secs(10), self.controller.wait())
            .await
            .expect("ingestion did not finish");
        self.controller.progress().await.status
    }
}

#[tokio::test]
async fn test_single_work_then_empty_page_completes() {
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/Symphony_No.5_(Beethoven,_Ludwig_van)";

    h.pages
        .add_page(0, vec![fixtures::work_ref(1_000_000, permalink)])
        .await;
    h.add_work(
        permalink,
        &[
            (LABEL_TITLE, "Symphony No.5"),
            (LABEL_COMPOSER, "Beethoven, Ludwig van"),
            (LABEL_KEY, "C minor"),
        ],
        &["Special:ImagefromIndex/51234"],
    )
    .await;
    h.web
        .add_page(
            "https://imslp.org/wiki/Special:ImagefromIndex/51234",
            &fixtures::marker_landing("https://imslp.org/files/score.pdf"),
        )
        .await;

    assert_eq!(h.run(2).await, IngestionStatus::Completed);

    assert_eq!(h.store.count().unwrap(), 1);
    let entry = h.store.get(1_000_000).unwrap();
    assert_eq!(entry.permalink, permalink);
    assert_eq!(entry.fields.title, "Symphony No.5");
    assert_eq!(entry.fields.composer, "Beethoven, Ludwig van");
    assert_eq!(entry.fields.key, "C minor");
    assert_eq!(entry.raw_metadata.len(), 3);
    assert_eq!(entry.pdf_urls, vec!["https://imslp.org/files/score.pdf"]);

    assert_eq!(h.pages.requested_offsets().await, vec![0, 1000]);

    let progress = h.controller.progress().await;
    assert_eq!(progress.works_stored, 1);
    assert_eq!(progress.current_page, 1);
    assert_eq!(progress.total_pages, 2);
    assert!(progress.run_id.is_some());
    assert!(progress.finished_at.is_some());
    assert!(progress.last_error.is_none());
}

#[tokio::test]
async fn test_cancel_stops_after_first_committed_work() {
    let h = Harness::new();
    let works: Vec<_> = (0..3)
        .map(|i| fixtures::work_ref(i, &format!("https://imslp.org/wiki/Work_{}", i)))
        .collect();
    for work in &works {
        h.add_work(&work.permalink, &[], &[]).await;
    }
    h.pages.add_page(0, works).await;

    let gate = h.pages.gate();
    h.controller.start(1).await.unwrap();

    // Cancellation lands before the page is processed.
    h.controller.cancel();
    assert!(h.controller.progress().await.cancel_requested);
    gate.release(1);
    h.controller.wait().await;

    let progress = h.controller.progress().await;
    assert_eq!(progress.status, IngestionStatus::Cancelled);

    let stored = h.store.count().unwrap();
    assert!(stored > 0 && stored < 3, "stored {} of 3", stored);
    assert_eq!(stored, 1);
    assert_eq!(progress.works_stored, 1);
}

#[tokio::test]
async fn test_cancel_mid_page_skips_remaining_works() {
    let h = Harness::new();
    let works: Vec<_> = (0..3)
        .map(|i| fixtures::work_ref(i, &format!("https://imslp.org/wiki/Work_{}", i)))
        .collect();
    for work in &works {
        h.add_work(&work.permalink, &[], &[]).await;
    }
    h.pages.add_page(0, works).await;

    let second = "https://imslp.org/wiki/Work_1";
    let third = "https://imslp.org/wiki/Work_2";
    let gate = h.web.hold(second).await;

    h.controller.start(1).await.unwrap();

    // Wait until the second work's detail fetch is in flight.
    tokio::time::timeout(Duration::from_secs(10), async {
        while !h.web.requests().await.iter().any(|r| r.url == second) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("second detail page never requested");
    assert_eq!(h.store.count().unwrap(), 1);

    h.controller.cancel();
    gate.release(1);
    h.controller.wait().await;

    let progress = h.controller.progress().await;
    assert_eq!(progress.status, IngestionStatus::Cancelled);
    assert_eq!(progress.works_stored, 2);

    // The in-flight work was committed; the third was never fetched.
    assert_eq!(h.store.count().unwrap(), 2);
    assert!(h.store.get(1).is_ok());
    assert!(!h.web.requests().await.iter().any(|r| r.url == third));
}

#[tokio::test]
async fn test_all_pages_processed_completes() {
    let h = Harness::new();
    for page in 0..2u64 {
        let id = (page * 1000) as i64;
        let permalink = format!("https://imslp.org/wiki/Page_{}", page);
        h.add_work(&permalink, &[], &[]).await;
        h.pages
            .add_page(page * 1000, vec![fixtures::work_ref(id, &permalink)])
            .await;
    }

    assert_eq!(h.run(2).await, IngestionStatus::Completed);
    assert_eq!(h.store.count().unwrap(), 2);
    // No request beyond total_pages.
    assert_eq!(h.pages.requested_offsets().await, vec![0, 1000]);
}

#[tokio::test]
async fn test_empty_catalog_completes_without_writes() {
    let h = Harness::new();
    assert_eq!(h.run(5).await, IngestionStatus::Completed);
    assert_eq!(h.store.count().unwrap(), 0);
    assert_eq!(h.pages.requested_offsets().await, vec![0]);
}

#[tokio::test]
async fn test_listing_failure_marks_run_failed() {
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/First";
    h.add_work(permalink, &[], &[]).await;
    h.pages.add_page(0, vec![fixtures::work_ref(0, permalink)]).await;
    h.pages.fail_at(1000, "upstream unavailable").await;

    assert_eq!(h.run(3).await, IngestionStatus::Failed);

    // Work committed before the failure stays.
    assert_eq!(h.store.count().unwrap(), 1);

    let progress = h.controller.progress().await;
    assert!(progress
        .last_error
        .as_deref()
        .unwrap()
        .contains("upstream unavailable"));

    // A failed run does not block the next one.
    assert!(h.controller.start(1).await.is_ok());
    h.controller.wait().await;
}

#[tokio::test]
async fn test_missing_detail_page_stores_listing_fallbacks() {
    let h = Harness::new();
    let gone = "https://imslp.org/wiki/Gone";
    let present = "https://imslp.org/wiki/Present";
    h.web
        .add_page(gone, "<html><body>There is currently no text in this page.</body></html>")
        .await;
    h.add_work(present, &[(LABEL_TITLE, "Etude")], &[]).await;
    h.pages
        .add_page(
            0,
            vec![fixtures::work_ref(3, gone), fixtures::work_ref(4, present)],
        )
        .await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert_eq!(h.store.count().unwrap(), 2);

    let entry = h.store.get(3).unwrap();
    assert_eq!(entry.fields.title, "Work 3");
    assert_eq!(entry.fields.composer, "Composer 3");
    assert!(entry.raw_metadata.is_empty());
    assert!(entry.pdf_urls.is_empty());

    assert_eq!(h.store.get(4).unwrap().fields.title, "Etude");
}

#[tokio::test]
async fn test_detail_transport_failure_marks_run_failed() {
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/Unreachable";
    h.web.fail(permalink, "connection reset by peer").await;
    h.pages
        .add_page(0, vec![fixtures::work_ref(3, permalink)])
        .await;

    assert_eq!(h.run(1).await, IngestionStatus::Failed);
    assert_eq!(h.store.count().unwrap(), 0);

    let progress = h.controller.progress().await;
    assert!(progress
        .last_error
        .as_deref()
        .unwrap()
        .contains("connection reset by peer"));
}

#[tokio::test]
async fn test_start_rejected_while_running() {
    let h = Harness::new();
    let gate = h.pages.gate();

    h.controller.start(1).await.unwrap();
    let result = h.controller.start(1).await;
    assert!(matches!(result, Err(IngestError::AlreadyRunning { .. })));

    gate.release(1);
    h.controller.wait().await;
    assert_eq!(
        h.controller.progress().await.status,
        IngestionStatus::Completed
    );
}

#[tokio::test]
async fn test_start_zero_pages_rejected() {
    let h = Harness::new();
    assert!(matches!(
        h.controller.start(0).await,
        Err(IngestError::InvalidPageCount)
    ));
    assert_eq!(h.controller.progress().await.status, IngestionStatus::Idle);
}

#[tokio::test]
async fn test_start_resets_cancel_flag() {
    let h = Harness::new();
    h.controller.cancel();
    assert!(h.controller.progress().await.cancel_requested);

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert!(!h.controller.progress().await.cancel_requested);
}

#[tokio::test]
async fn test_reingestion_converges() {
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(8, permalink)]).await;
    h.add_work(permalink, &[(LABEL_KEY, "D major")], &[]).await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert_eq!(h.store.get(8).unwrap().fields.key, "D major");

    // Upstream edit: newest value wins, still one row.
    h.add_work(permalink, &[(LABEL_KEY, "D minor")], &[]).await;
    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert_eq!(h.store.count().unwrap(), 1);
    assert_eq!(h.store.get(8).unwrap().fields.key, "D minor");
}

#[tokio::test]
async fn test_listing_fallbacks_when_metadata_skipped() {
    let h = Harness::with(MockEnricher::new(), OverwritePolicy::Always, true);
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(4, permalink)]).await;
    h.add_work(permalink, &[(LABEL_TITLE, "Detail title")], &[]).await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);

    let entry = h.store.get(4).unwrap();
    assert_eq!(entry.fields.title, "Work 4");
    assert_eq!(entry.fields.composer, "Composer 4");
    assert!(entry.raw_metadata.is_empty());
}

#[tokio::test]
async fn test_enrichment_overwrites_by_default() {
    let patch = WorkFields {
        title: "Enriched title".to_string(),
        period: "Romantic".to_string(),
        ..Default::default()
    };
    let h = Harness::with(MockEnricher::returning(patch), OverwritePolicy::Always, false);
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(1, permalink)]).await;
    h.add_work(permalink, &[(LABEL_TITLE, "Extracted title")], &[]).await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert_eq!(h.enricher.calls(), 1);

    let entry = h.store.get(1).unwrap();
    assert_eq!(entry.fields.title, "Enriched title");
    assert_eq!(entry.fields.period, "Romantic");
}

#[tokio::test]
async fn test_fill_missing_keeps_extracted_values() {
    let patch = WorkFields {
        title: "Enriched title".to_string(),
        period: "Romantic".to_string(),
        ..Default::default()
    };
    let h = Harness::with(
        MockEnricher::returning(patch),
        OverwritePolicy::FillMissing,
        false,
    );
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(1, permalink)]).await;
    h.add_work(permalink, &[(LABEL_TITLE, "Extracted title")], &[]).await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);

    let entry = h.store.get(1).unwrap();
    assert_eq!(entry.fields.title, "Extracted title");
    assert_eq!(entry.fields.period, "Romantic");
}

#[tokio::test]
async fn test_unchanged_enrichment_still_stores_entry() {
    // An enricher that gives nothing back looks exactly like an absorbed failure.
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(2, permalink)]).await;
    h.add_work(permalink, &[(LABEL_KEY, "E flat major")], &[]).await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert_eq!(h.enricher.calls(), 1);
    assert_eq!(h.store.get(2).unwrap().fields.key, "E flat major");
}

#[tokio::test]
async fn test_unresolvable_editions_do_not_abort() {
    let h = Harness::new();
    let permalink = "https://imslp.org/wiki/Work";
    h.pages.add_page(0, vec![fixtures::work_ref(6, permalink)]).await;
    // Neither landing page exists.
    h.add_work(
        permalink,
        &[],
        &["Special:ImagefromIndex/1", "Special:ImagefromIndex/2"],
    )
    .await;

    assert_eq!(h.run(1).await, IngestionStatus::Completed);
    assert!(h.store.get(6).unwrap().pdf_urls.is_empty());
}
