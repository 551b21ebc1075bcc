//! Crawler module for documentation sections
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with typed failures
//! - Discovery of a section's pages from its root
//! - Page normalization into text, markdown, code snippets and keywords
//! - Content-hash change detection
//! - Rate limiting and retry backoff
//! - Batch orchestration and job progress

mod dedup;
mod discovery;
mod fetcher;
mod normalizer;
mod orchestrator;
mod scheduler;

pub use dedup::{content_hash, PersistDecision};
pub use discovery::{discover, extract_links, DiscoveryScope};
pub use fetcher::{build_http_client, Document, FetchError, Fetcher};
pub use normalizer::{extract_keywords, CodeSnippet, Normalizer, PageResult};
pub use orchestrator::{CrawlSummary, Crawler, StartedCrawl};
pub use scheduler::{fetch_with_retry, RateLimiter, RetryPolicy, SharedRateLimiter};
