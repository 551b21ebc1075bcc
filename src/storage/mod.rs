//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Deduplicated page content keyed by URL
//! - Content source resolution
//! - Job progress records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ContentStore, JobTracker, Storage, StorageError, StorageResult};

use crate::crawler::CodeSnippet;
use crate::state::JobStatus;

/// A page as persisted by the content store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredContent {
    pub id: i64,
    pub source_id: i64,
    pub url: String,
    pub category: String,
    pub title: String,
    pub content_type: String,
    pub content: String,
    pub markdown: String,
    pub code_snippets: Vec<CodeSnippet>,
    pub word_count: u32,
    pub character_count: u32,
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub content_hash: String,
    pub processed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Filter for listing jobs; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub section: Option<String>,
}
