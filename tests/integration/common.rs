//! Shared fixtures: a mock documentation site and a store that records every
//! job update it receives

use std::time::Instant;
use sumi_folio::crawler::PageResult;
use sumi_folio::state::{Job, JobStatus, JobUpdate};
use sumi_folio::storage::{
    ContentStore, JobFilter, JobTracker, StorageError, StorageResult, StoredContent,
};
use sumi_folio::{Config, Section, SqliteStorage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SECTION_PATH: &str = "/en-US/docs/Test";

/// Delay between batches used by the test configuration
pub const DELAY_MS: u64 = 200;

/// SQLite store that keeps a timestamped copy of every job update
pub struct RecordingStore {
    inner: SqliteStorage,
    pub updates: Vec<(Instant, JobUpdate)>,
    pub upserts: usize,
    /// Reject updates that only carry progress counters
    pub fail_progress_updates: bool,
    /// Reject the `pending -> running` update
    pub fail_start_update: bool,
    /// Reject content writes for this page URL
    pub fail_upsert_url: Option<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStorage::new_in_memory().unwrap(),
            updates: Vec::new(),
            upserts: 0,
            fail_progress_updates: false,
            fail_start_update: false,
            fail_upsert_url: None,
        }
    }

    /// Updates carrying progress counters, in the order they were applied
    pub fn progress_updates(&self) -> Vec<(Instant, JobUpdate)> {
        self.updates
            .iter()
            .filter(|(_, update)| update.urls_processed.is_some())
            .cloned()
            .collect()
    }
}

impl ContentStore for RecordingStore {
    fn get_content_hash(&self, url: &str) -> StorageResult<Option<String>> {
        self.inner.get_content_hash(url)
    }

    fn upsert_content(
        &mut self,
        source_id: i64,
        category: &str,
        page: &PageResult,
        content_hash: &str,
    ) -> StorageResult<()> {
        if self.fail_upsert_url.as_deref() == Some(page.url.as_str()) {
            return Err(StorageError::Database("content write rejected".to_string()));
        }

        self.upserts += 1;
        self.inner
            .upsert_content(source_id, category, page, content_hash)
    }

    fn get_or_create_source(&mut self, base_url: &str) -> StorageResult<i64> {
        self.inner.get_or_create_source(base_url)
    }

    fn get_content(&self, url: &str) -> StorageResult<Option<StoredContent>> {
        self.inner.get_content(url)
    }

    fn count_content(&self) -> StorageResult<u64> {
        self.inner.count_content()
    }
}

impl JobTracker for RecordingStore {
    fn create_job(&mut self, section: &str) -> StorageResult<i64> {
        self.inner.create_job(section)
    }

    fn update_job(&mut self, job_id: i64, update: &JobUpdate) -> StorageResult<()> {
        if self.fail_progress_updates && update.urls_processed.is_some() {
            return Err(StorageError::Database("progress write rejected".to_string()));
        }
        if self.fail_start_update && update.status == Some(JobStatus::Running) {
            return Err(StorageError::Database("start write rejected".to_string()));
        }

        self.updates.push((Instant::now(), update.clone()));
        self.inner.update_job(job_id, update)
    }

    fn get_job(&self, job_id: i64) -> StorageResult<Job> {
        self.inner.get_job(job_id)
    }

    fn list_jobs(&self, filter: &JobFilter, limit: usize) -> StorageResult<Vec<Job>> {
        self.inner.list_jobs(filter, limit)
    }
}

/// Configuration crawling the `test` section of the mock site
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.crawler.concurrency = 3;
    config.crawler.delay_ms = DELAY_MS;
    config.crawler.timeout_ms = 2_000;
    config.crawler.max_retries = 0;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.rate_limit_per_minute = 1_000;
    config.crawler.rate_limit_per_hour = 10_000;
    config.site.base_url = server.uri();
    config.sections = vec![Section {
        title: "Test".to_string(),
        slug: "test".to_string(),
        url: root_url(server),
        category: "testing".to_string(),
    }];
    config
}

pub fn root_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), SECTION_PATH)
}

pub fn child_path(i: usize) -> String {
    format!("{}/page-{}", SECTION_PATH, i)
}

pub fn child_url(server: &MockServer, i: usize) -> String {
    format!("{}{}", server.uri(), child_path(i))
}

fn html(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

/// Page body with a title, some text and one code block
pub fn doc_page(title: &str, text: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Docs</title></head><body>
        <main class="main-page-content">
          <h1>{title}</h1>
          <p>{text}</p>
          <pre><code class="language-js">console.log("{title}");</code></pre>
        </main>
        </body></html>"#
    )
}

/// Serves a section root linking to `children` child pages, and the children
pub async fn mount_section(server: &MockServer, children: usize) {
    let links: String = (1..=children)
        .map(|i| format!(r#"<li><a href="{}">Page {}</a></li>"#, child_path(i), i))
        .collect();
    let root = format!(
        r#"<html><body><main class="main-page-content"><h1>Test section</h1>
        <p>Section overview text</p><ul>{links}</ul>
        <a href="https://elsewhere.example.com/en-US/docs/Other">external</a>
        <a href="/en-US/blog/post">blog</a>
        </main></body></html>"#
    );

    Mock::given(method("GET"))
        .and(path(SECTION_PATH))
        .respond_with(html(200, root))
        .mount(server)
        .await;

    for i in 1..=children {
        mount_page(server, &child_path(i), 200, doc_page(&format!("Page {}", i), "Some documentation text")).await;
    }
}

pub async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(status, body))
        .mount(server)
        .await;
}

/// Asserts the counter invariants on every recorded progress update
pub fn assert_progress_invariants(updates: &[(Instant, JobUpdate)]) {
    let mut last_pct = 0.0;

    for (_, update) in updates {
        let processed = update.urls_processed.unwrap();
        let scraped = update.items_scraped.unwrap();
        let failed = update.urls_failed.unwrap();
        let pct = update.progress_percentage.unwrap();

        assert_eq!(processed, scraped + failed);
        assert!((0.0..=100.0).contains(&pct), "percentage out of range: {}", pct);
        assert!(pct >= last_pct, "percentage went backwards");
        last_pct = pct;
    }
}
