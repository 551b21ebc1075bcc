use crate::state::JobStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Progress record of one crawl job
///
/// The store is the system of record; while a job is `Running` the orchestrator
/// driving it is the only writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: i64,

    /// Slug of the crawled section
    pub section: String,

    pub status: JobStatus,

    /// Number of discovered URLs; fixed once the job is running
    pub total_urls: u32,

    /// Always `items_scraped + urls_failed`
    pub urls_processed: u32,

    pub urls_failed: u32,

    /// `urls_processed / total_urls * 100`, in `0..=100`
    pub progress_percentage: f64,

    pub items_scraped: u32,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A field-level partial update of a job record
///
/// Fields left as `None` keep their stored value, so the same update can be
/// applied twice without changing the outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub total_urls: Option<u32>,
    pub urls_processed: Option<u32>,
    pub urls_failed: Option<u32>,
    pub progress_percentage: Option<f64>,
    pub items_scraped: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// `pending -> running`, recorded together with the discovered total
    pub fn started(total_urls: u32, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Running),
            total_urls: Some(total_urls),
            started_at: Some(at),
            ..Self::default()
        }
    }

    /// Counter snapshot written after every processed page
    pub fn progress(progress: &JobProgress) -> Self {
        Self {
            urls_processed: Some(progress.urls_processed()),
            urls_failed: Some(progress.urls_failed),
            progress_percentage: Some(progress.percentage()),
            items_scraped: Some(progress.items_scraped),
            ..Self::default()
        }
    }

    /// `running -> completed`
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            completed_at: Some(at),
            ..Self::default()
        }
    }

    /// `{pending | running} -> failed`
    pub fn failed(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error_message: Some(message.into()),
            completed_at: Some(at),
            ..Self::default()
        }
    }
}

/// Counters advanced by a running crawl
///
/// `urls_processed` is derived, which keeps `processed == scraped + failed`
/// true at every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub total_urls: u32,
    pub items_scraped: u32,
    pub urls_failed: u32,
}

impl JobProgress {
    pub fn new(total_urls: u32) -> Self {
        Self {
            total_urls,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.items_scraped += 1;
    }

    pub fn record_failure(&mut self) {
        self.urls_failed += 1;
    }

    pub fn urls_processed(&self) -> u32 {
        self.items_scraped + self.urls_failed
    }

    /// Percentage of processed URLs, clamped to `0..=100`
    pub fn percentage(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        let pct = f64::from(self.urls_processed()) / f64::from(self.total_urls) * 100.0;
        pct.clamp(0.0, 100.0)
    }
}
