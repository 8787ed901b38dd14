//! Ingestion controller implementation.
//!
//! Runs one background task per job:
//! - Pages: sequential, with a randomized pause before each listing request
//! - Works: sequential within a page, one store commit per work
//! - Cancellation: cooperative, checked after each committed work

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::catalog::{ExternalWorkRef, PageFetcher, PAGE_SIZE};
use crate::enrich::{OverwritePolicy, RecordEnricher};
use crate::metrics::{INGEST_RUNS, PAGES_FETCHED, WORKS_STORED, WORK_DURATION};
use crate::scrape::{map_fields, AssetResolver, MetadataExtractor};
use crate::store::{CatalogEntry, CatalogStore};
use crate::web::WebClient;

use super::config::IngestConfig;
use super::types::{IngestError, IngestionStatus, JobProgress};

/// The per-work processing chain: detail fetch, extraction, asset
/// resolution, enrichment. Shared by every run of a controller.
pub struct IngestPipeline {
    config: IngestConfig,
    overwrite: OverwritePolicy,
    pages: Arc<dyn PageFetcher>,
    web: Arc<dyn WebClient>,
    extractor: MetadataExtractor,
    assets: AssetResolver,
    enricher: Arc<dyn RecordEnricher>,
    store: Arc<dyn CatalogStore>,
}

impl IngestPipeline {
    pub fn new(
        config: IngestConfig,
        pages: Arc<dyn PageFetcher>,
        web: Arc<dyn WebClient>,
        assets: AssetResolver,
        enricher: Arc<dyn RecordEnricher>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            config,
            overwrite: OverwritePolicy::default(),
            pages,
            web,
            extractor: MetadataExtractor::default(),
            assets,
            enricher,
            store,
        }
    }

    /// Set how enriched values are merged into extracted ones.
    pub fn with_overwrite_policy(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Build the catalog entry for one listed work.
    ///
    /// Only the detail page fetch can fail; extraction, asset resolution and
    /// enrichment degrade to empty or unchanged values.
    pub async fn process_work(&self, work: &ExternalWorkRef) -> Result<CatalogEntry, IngestError> {
        let html = self.web.get_html(&work.permalink, &[]).await?;

        let raw_metadata = self.extractor.extract(&html, self.config.skip_metadata);
        let pdf_urls = self.assets.resolve_assets(&html).await;

        let mut entry = CatalogEntry::new(work.id, &work.permalink);
        entry.fields = map_fields(&raw_metadata, work);
        entry.raw_metadata = raw_metadata;
        entry.pdf_urls = pdf_urls;

        let enriched = self.enricher.enrich(&entry).await;
        let extracted = std::mem::take(&mut entry.fields);
        entry.fields = self.overwrite.apply(extracted, enriched);

        debug!(
            work_id = entry.id,
            assets = entry.pdf_urls.len(),
            missing = entry.fields.missing_count(),
            "Built catalog entry"
        );

        Ok(entry)
    }
}

/// How a run loop ended without error.
enum RunOutcome {
    Completed,
    Cancelled,
}

/// Drives the ingestion job and exposes its progress.
///
/// At most one run is active at a time; `start` refuses to schedule a second
/// one until the first reaches a terminal state.
pub struct IngestionController {
    pipeline: Arc<IngestPipeline>,
    state: Arc<RwLock<JobProgress>>,
    cancel: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestionController {
    pub fn new(pipeline: IngestPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            state: Arc::new(RwLock::new(JobProgress::default())),
            cancel: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Schedule a run over `total_pages` listing pages and return its id.
    ///
    /// Returns as soon as the run is scheduled; the caller observes it through
    /// [`IngestionController::progress`].
    pub async fn start(&self, total_pages: u32) -> Result<Uuid, IngestError> {
        if total_pages == 0 {
            return Err(IngestError::InvalidPageCount);
        }

        let run_id = Uuid::new_v4();
        {
            let mut state = self.state.write().await;
            if state.status.is_active() {
                return Err(IngestError::AlreadyRunning {
                    status: state.status,
                });
            }

            self.cancel.store(false, Ordering::SeqCst);
            *state = JobProgress {
                status: IngestionStatus::Starting,
                current_page: 0,
                total_pages,
                cancel_requested: false,
                run_id: Some(run_id),
                works_stored: 0,
                last_error: None,
                started_at: Some(Utc::now()),
                finished_at: None,
            };
        }

        info!(%run_id, total_pages, "Scheduling ingestion run");

        let span = info_span!("ingestion", %run_id, total_pages);
        let handle = tokio::spawn(
            run(
                Arc::clone(&self.pipeline),
                Arc::clone(&self.state),
                Arc::clone(&self.cancel),
                total_pages,
            )
            .instrument(span),
        );
        *self.task.lock().await = Some(handle);

        Ok(run_id)
    }

    /// Request cancellation. Takes effect after the in-flight work is committed.
    pub fn cancel(&self) {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            info!("Ingestion cancellation requested");
        }
    }

    /// Snapshot of the job state.
    pub async fn progress(&self) -> JobProgress {
        let mut progress = self.state.read().await.clone();
        progress.cancel_requested = self.cancel.load(Ordering::SeqCst);
        progress
    }

    /// Wait for the current background task, if any, to finish.
    pub async fn wait(&self) {
        let handle = self.task.lock().await.take();
        let Some(handle) = handle else {
            return;
        };

        if let Err(e) = handle.await {
            error!("Ingestion task aborted: {}", e);
            let mut state = self.state.write().await;
            if state.status.is_active() {
                state.status = IngestionStatus::Failed;
                state.last_error = Some(format!("task aborted: {}", e));
                state.finished_at = Some(Utc::now());
            }
        }
    }

    /// Cancel any running job and wait for it to stop.
    pub async fn shutdown(&self) {
        if self.state.read().await.status.is_active() {
            self.cancel();
        }
        self.wait().await;
    }
}

async fn run(
    pipeline: Arc<IngestPipeline>,
    state: Arc<RwLock<JobProgress>>,
    cancel: Arc<AtomicBool>,
    total_pages: u32,
) {
    state.write().await.status = IngestionStatus::Processing;
    info!("Ingestion started");

    let outcome = run_pages(&pipeline, &state, &cancel, total_pages).await;

    let mut state = state.write().await;
    match outcome {
        Ok(RunOutcome::Completed) => {
            state.status = IngestionStatus::Completed;
            info!(works_stored = state.works_stored, "Ingestion completed");
        }
        Ok(RunOutcome::Cancelled) => {
            state.status = IngestionStatus::Cancelled;
            info!(works_stored = state.works_stored, "Ingestion cancelled");
        }
        Err(e) => {
            error!(
                page = state.current_page,
                works_stored = state.works_stored,
                "Ingestion failed: {}",
                e
            );
            state.status = IngestionStatus::Failed;
            state.last_error = Some(e.to_string());
        }
    }
    state.finished_at = Some(Utc::now());
    INGEST_RUNS.with_label_values(&[state.status.as_str()]).inc();
}

async fn run_pages(
    pipeline: &IngestPipeline,
    state: &RwLock<JobProgress>,
    cancel: &AtomicBool,
    total_pages: u32,
) -> Result<RunOutcome, IngestError> {
    for page_index in 0..total_pages {
        state.write().await.current_page = page_index;

        let pause = pipeline.config.backoff();
        debug!(page = page_index, "Waiting {:?} before listing request", pause);
        tokio::time::sleep(pause).await;

        let offset = u64::from(page_index) * PAGE_SIZE;
        let page = match pipeline.pages.fetch_page(offset).await {
            Ok(page) => page,
            Err(e) => {
                PAGES_FETCHED.with_label_values(&["error"]).inc();
                return Err(e.into());
            }
        };

        if page.is_empty() {
            PAGES_FETCHED.with_label_values(&["empty"]).inc();
            info!(page = page_index, "Catalog exhausted");
            return Ok(RunOutcome::Completed);
        }
        PAGES_FETCHED.with_label_values(&["items"]).inc();
        debug!(page = page_index, works = page.len(), "Processing listing page");

        for work in page.values() {
            let timer = WORK_DURATION.start_timer();

            let entry = pipeline.process_work(work).await?;
            pipeline.store.upsert(&entry)?;

            timer.observe_duration();
            WORKS_STORED.inc();
            state.write().await.works_stored += 1;

            if cancel.load(Ordering::SeqCst) {
                info!(work_id = work.id, "Stopping after committed work");
                return Ok(RunOutcome::Cancelled);
            }
        }
    }

    Ok(RunOutcome::Completed)
}
