//! Crawl orchestration
//!
//! A [`Crawler`] drives one section per job:
//! - Discovers the section's URLs from its root page
//! - Fetches and normalizes them in fixed-size concurrent batches
//! - Persists new or changed pages
//! - Writes job progress after every page
//! - Finalizes the job as completed or failed

use crate::catalog::{find_section, list_sections, Section};
use crate::config::{validate, Config};
use crate::crawler::dedup::{content_hash, PersistDecision};
use crate::crawler::discovery::{discover, DiscoveryScope};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::normalizer::{Normalizer, PageResult};
use crate::crawler::scheduler::{fetch_with_retry, RateLimiter, RetryPolicy, SharedRateLimiter};
use crate::state::{Job, JobProgress, JobStatus, JobUpdate};
use crate::storage::{JobFilter, Storage, StorageError, StorageResult};
use crate::{FolioError, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Outcome of one finished job run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages normalized successfully, written or not
    pub success: u32,

    /// Pages that could not be fetched, normalized or stored
    pub failed: u32,

    /// Discovered URLs
    pub total: u32,

    /// Pages inserted or updated in the content store
    pub written: u32,

    /// Pages skipped because their content hash was unchanged
    pub unchanged: u32,
}

/// A crawl running in the background
#[derive(Debug)]
pub struct StartedCrawl {
    pub job_id: i64,
    pub handle: JoinHandle<Result<CrawlSummary>>,
}

/// Section crawler bound to one configuration and one store
///
/// Cloning is cheap; clones share the store and the rate limiter.
pub struct Crawler<S> {
    config: Arc<Config>,
    sections: Arc<Vec<Section>>,
    storage: Arc<Mutex<S>>,
    fetcher: Fetcher,
    limiter: SharedRateLimiter,
    normalizer: Normalizer,
    retry: RetryPolicy,
    site: Url,
}

impl<S> Clone for Crawler<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            sections: Arc::clone(&self.sections),
            storage: Arc::clone(&self.storage),
            fetcher: self.fetcher.clone(),
            limiter: self.limiter.clone(),
            normalizer: self.normalizer.clone(),
            retry: self.retry,
            site: self.site.clone(),
        }
    }
}

impl<S: Storage + Send + 'static> Crawler<S> {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration, validated here; fixed for the crawler's lifetime
    /// * `storage` - Content store and job tracker
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to start jobs
    /// * `Err(FolioError)` - The configuration is invalid or the HTTP client
    ///   could not be set up
    pub fn new(config: Config, storage: S) -> Result<Self> {
        validate(&config)?;

        let site = Url::parse(&config.site.base_url)?;
        let fetcher = Fetcher::new(
            &config.user_agent,
            Duration::from_millis(config.crawler.timeout_ms),
        )?;

        Ok(Self {
            sections: Arc::new(list_sections(&config)),
            storage: Arc::new(Mutex::new(storage)),
            limiter: SharedRateLimiter::new(RateLimiter::from_config(&config.crawler)),
            normalizer: Normalizer::from_config(&config),
            retry: RetryPolicy::from_config(&config.crawler),
            config: Arc::new(config),
            fetcher,
            site,
        })
    }

    /// The store shared by every job of this crawler
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// The static section catalog, in catalog order
    pub fn list_sections(&self) -> &[Section] {
        &self.sections
    }

    /// Creates a `pending` job for `slug` and runs it on the tokio runtime
    ///
    /// Returns as soon as the job exists; progress is observed by polling
    /// [`Crawler::get_job`]. Must be called from within a tokio runtime.
    pub fn start_crawl(&self, slug: &str) -> Result<StartedCrawl> {
        let section = find_section(&self.sections, slug)
            .cloned()
            .ok_or_else(|| FolioError::UnknownSection(slug.to_string()))?;

        let job_id = self.store()?.create_job(&section.slug)?;
        tracing::info!("Created job {} for section '{}'", job_id, section.slug);

        let crawler = self.clone();
        let handle = tokio::spawn(async move { crawler.run_job(job_id, &section).await });

        Ok(StartedCrawl { job_id, handle })
    }

    /// Drives a `pending` job to a terminal state
    ///
    /// Page failures are counted, never returned. A structural error marks the
    /// job `failed` and is returned.
    pub async fn run_job(&self, job_id: i64, section: &Section) -> Result<CrawlSummary> {
        match self.crawl_section(job_id, section).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!(
                    "Crawl of section '{}' (job {}) failed: {}",
                    section.slug,
                    job_id,
                    e
                );
                self.mark_failed(job_id, &e.to_string());
                Err(e)
            }
        }
    }

    /// Gets a job by ID
    pub fn get_job(&self, job_id: i64) -> Result<Job> {
        self.store()?.get_job(job_id).map_err(job_error)
    }

    /// Lists jobs matching `filter`, most recent first
    pub fn list_jobs(&self, filter: &JobFilter, limit: usize) -> Result<Vec<Job>> {
        Ok(self.store()?.list_jobs(filter, limit)?)
    }

    fn store(&self) -> StorageResult<MutexGuard<'_, S>> {
        self.storage
            .lock()
            .map_err(|_| StorageError::Database("storage lock poisoned".to_string()))
    }

    async fn crawl_section(&self, job_id: i64, section: &Section) -> Result<CrawlSummary> {
        let job = self.get_job(job_id)?;
        ensure_transition(job.status, JobStatus::Running)?;

        let source_id = self.store()?.get_or_create_source(&self.config.site.base_url)?;

        tracing::info!("Starting crawl of section '{}' (job {})", section.slug, job_id);

        let scope = DiscoveryScope {
            site: self.site.clone(),
            path_prefix: self.config.site.docs_path_prefix.clone(),
            cap: self.config.crawler.discovery_cap,
        };
        let urls = discover(&self.fetcher, &self.limiter, &self.retry, &section.url, &scope).await;
        let total = u32::try_from(urls.len()).unwrap_or(u32::MAX);

        self.store()?
            .update_job(job_id, &JobUpdate::started(total, Utc::now()))?;

        let mut progress = JobProgress::new(total);
        let mut summary = CrawlSummary {
            total,
            ..CrawlSummary::default()
        };

        let batch_size = self.config.crawler.concurrency.max(1);
        let delay = Duration::from_millis(self.config.crawler.delay_ms);
        let batch_count = urls.len().div_ceil(batch_size);

        for (index, batch) in urls.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Processing batch {}/{} of section '{}' ({} URLs)",
                index + 1,
                batch_count,
                section.slug,
                batch.len()
            );

            // join_all yields results in submission order
            let pages = join_all(batch.iter().map(|url| self.process_page(url))).await;

            for page in pages {
                self.record_page(source_id, section, &page, &mut progress, &mut summary);

                if let Err(e) = self
                    .store()
                    .and_then(|mut store| store.update_job(job_id, &JobUpdate::progress(&progress)))
                {
                    tracing::warn!("Failed to record progress of job {}: {}", job_id, e);
                }
            }

            if index + 1 < batch_count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let job = self.get_job(job_id)?;
        ensure_transition(job.status, JobStatus::Completed)?;
        self.store()?
            .update_job(job_id, &JobUpdate::completed(Utc::now()))?;

        tracing::info!(
            "Finished section '{}' (job {}): {} succeeded, {} failed, {} written, {} unchanged",
            section.slug,
            job_id,
            summary.success,
            summary.failed,
            summary.written,
            summary.unchanged
        );

        Ok(summary)
    }

    /// Fetches and normalizes one URL; never fails
    async fn process_page(&self, url: &str) -> PageResult {
        match fetch_with_retry(&self.fetcher, &self.limiter, &self.retry, url).await {
            Ok(document) => self.normalizer.normalize(url, &document.body),
            Err(e) => {
                tracing::debug!("Fetch failed: {}", e);
                PageResult::failure(url, e.to_string())
            }
        }
    }

    /// Persists a page if needed and advances the counters
    fn record_page(
        &self,
        source_id: i64,
        section: &Section,
        page: &PageResult,
        progress: &mut JobProgress,
        summary: &mut CrawlSummary,
    ) {
        if !page.success {
            progress.record_failure();
            summary.failed += 1;
            return;
        }

        match self.persist(source_id, &section.category, page) {
            Ok(decision) => {
                progress.record_success();
                summary.success += 1;
                if decision.needs_write() {
                    summary.written += 1;
                } else {
                    summary.unchanged += 1;
                }
                tracing::debug!("Processed {} ({:?})", page.url, decision);
            }
            Err(e) => {
                tracing::warn!("Failed to store {}: {}", page.url, e);
                progress.record_failure();
                summary.failed += 1;
            }
        }
    }

    fn persist(
        &self,
        source_id: i64,
        category: &str,
        page: &PageResult,
    ) -> StorageResult<PersistDecision> {
        let hash = content_hash(&page.content);
        let mut store = self.store()?;

        let stored = store.get_content_hash(&page.url)?;
        let decision = PersistDecision::decide(stored.as_deref(), &hash);
        if decision.needs_write() {
            store.upsert_content(source_id, category, page, &hash)?;
        }

        Ok(decision)
    }

    /// Best-effort `-> failed` transition after a structural error
    fn mark_failed(&self, job_id: i64, message: &str) {
        let result = self.store().and_then(|mut store| {
            let status = store.get_job(job_id)?.status;
            if !status.can_transition_to(JobStatus::Failed) {
                tracing::warn!("Job {} is already {}, not marking it failed", job_id, status);
                return Ok(());
            }
            store.update_job(job_id, &JobUpdate::failed(message, Utc::now()))
        });

        if let Err(e) = result {
            tracing::error!("Failed to mark job {} as failed: {}", job_id, e);
        }
    }
}

fn ensure_transition(from: JobStatus, to: JobStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(FolioError::InvalidTransition { from, to })
    }
}

fn job_error(err: StorageError) -> FolioError {
    match err {
        StorageError::JobNotFound(id) => FolioError::JobNotFound(id),
        other => other.into(),
    }
}
