//! Storage traits and error types
//!
//! This module defines the two interfaces the crawler consumes: the content
//! store (deduplicated page content keyed by URL) and the job tracker (mutable
//! job progress records).

use crate::crawler::PageResult;
use crate::state::{Job, JobUpdate};
use crate::storage::{JobFilter, StoredContent};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent store of normalized pages
///
/// Pages are keyed by URL. The content hash is only ever compared for
/// equality; its format belongs to the caller.
pub trait ContentStore {
    /// Gets the stored content hash for a URL, if the URL was stored before
    fn get_content_hash(&self, url: &str) -> StorageResult<Option<String>>;

    /// Inserts a page or replaces the stored version of the same URL
    ///
    /// # Arguments
    ///
    /// * `source_id` - Source the page belongs to
    /// * `category` - Category of the section the page was crawled from
    /// * `page` - The normalized page
    /// * `content_hash` - Hash of the normalized content
    fn upsert_content(
        &mut self,
        source_id: i64,
        category: &str,
        page: &PageResult,
        content_hash: &str,
    ) -> StorageResult<()>;

    /// Resolves the identifier of a content source, creating it on first use
    fn get_or_create_source(&mut self, base_url: &str) -> StorageResult<i64>;

    /// Gets a stored page by URL
    fn get_content(&self, url: &str) -> StorageResult<Option<StoredContent>>;

    /// Counts stored pages
    fn count_content(&self) -> StorageResult<u64>;
}

/// Store of crawl job records
///
/// `update_job` is called once per processed page, so implementations should
/// keep it cheap.
pub trait JobTracker {
    /// Creates a `pending` job for a section with all counters at zero
    fn create_job(&mut self, section: &str) -> StorageResult<i64>;

    /// Applies a partial update; fields left unset keep their value
    fn update_job(&mut self, job_id: i64, update: &JobUpdate) -> StorageResult<()>;

    /// Gets a job by ID
    fn get_job(&self, job_id: i64) -> StorageResult<Job>;

    /// Lists jobs matching the filter, most recent first
    fn list_jobs(&self, filter: &JobFilter, limit: usize) -> StorageResult<Vec<Job>>;
}

/// Everything the crawl orchestrator needs from its backend
pub trait Storage: ContentStore + JobTracker {}

impl<T: ContentStore + JobTracker> Storage for T {}
