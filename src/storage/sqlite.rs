//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the content store and
//! the job tracker.

use crate::crawler::PageResult;
use crate::state::{Job, JobStatus, JobUpdate};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContentStore, JobTracker, StorageError, StorageResult};
use crate::storage::{JobFilter, StoredContent};
use crate::FolioError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Content type recorded for every crawled page
const DOCUMENTATION_PAGE: &str = "documentation_page";

const JOB_COLUMNS: &str = "id, section, status, total_urls, urls_processed, urls_failed,
     progress_percentage, items_scraped, started_at, completed_at, error_message, created_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(FolioError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, FolioError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, FolioError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }
}

fn to_db_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339())
}

/// Reads an RFC 3339 timestamp column; a malformed value is a conversion error
fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            s.parse::<DateTime<Utc>>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        })
        .transpose()
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let status: String = row.get(2)?;
    let status = JobStatus::from_db_string(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown job status '{}'", status).into(),
        )
    })?;
    let created_at = time_column(row, 11)?.ok_or(rusqlite::Error::InvalidColumnType(
        11,
        "created_at".to_string(),
        Type::Null,
    ))?;

    Ok(Job {
        id: row.get(0)?,
        section: row.get(1)?,
        status,
        total_urls: row.get(3)?,
        urls_processed: row.get(4)?,
        urls_failed: row.get(5)?,
        progress_percentage: row.get(6)?,
        items_scraped: row.get(7)?,
        started_at: time_column(row, 8)?,
        completed_at: time_column(row, 9)?,
        error_message: row.get(10)?,
        created_at,
    })
}

impl ContentStore for SqliteStorage {
    fn get_content_hash(&self, url: &str) -> StorageResult<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT content_hash FROM content WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn upsert_content(
        &mut self,
        source_id: i64,
        category: &str,
        page: &PageResult,
        content_hash: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let code_snippets = serde_json::to_string(&page.code_snippets)?;
        let keywords = serde_json::to_string(&page.keywords)?;
        let topics = serde_json::to_string(&page.topics)?;

        // A changed page goes back to unprocessed for downstream consumers
        self.conn.execute(
            "INSERT INTO content (source_id, url, category, title, content_type, content, markdown,
                 code_snippets, word_count, character_count, keywords, topics, content_hash,
                 processed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0, ?14, ?14)
             ON CONFLICT(url) DO UPDATE SET
                 source_id = excluded.source_id,
                 category = excluded.category,
                 title = excluded.title,
                 content_type = excluded.content_type,
                 content = excluded.content,
                 markdown = excluded.markdown,
                 code_snippets = excluded.code_snippets,
                 word_count = excluded.word_count,
                 character_count = excluded.character_count,
                 keywords = excluded.keywords,
                 topics = excluded.topics,
                 content_hash = excluded.content_hash,
                 processed = 0,
                 updated_at = excluded.updated_at",
            params![
                source_id,
                page.url,
                category,
                page.title,
                DOCUMENTATION_PAGE,
                page.content,
                page.markdown,
                code_snippets,
                page.word_count,
                page.character_count,
                keywords,
                topics,
                content_hash,
                now,
            ],
        )?;
        Ok(())
    }

    fn get_or_create_source(&mut self, base_url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO sources (base_url, created_at) VALUES (?1, ?2)",
            params![base_url, now],
        )?;

        self.conn
            .query_row(
                "SELECT id FROM sources WHERE base_url = ?1",
                params![base_url],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::SourceNotFound(base_url.to_string()))
    }

    fn get_content(&self, url: &str) -> StorageResult<Option<StoredContent>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, source_id, url, category, title, content_type, content, markdown,
                 code_snippets, word_count, character_count, keywords, topics, content_hash,
                 processed, created_at, updated_at
                 FROM content WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        StoredContent {
                            id: row.get(0)?,
                            source_id: row.get(1)?,
                            url: row.get(2)?,
                            category: row.get(3)?,
                            title: row.get(4)?,
                            content_type: row.get(5)?,
                            content: row.get(6)?,
                            markdown: row.get(7)?,
                            code_snippets: Vec::new(),
                            word_count: row.get(9)?,
                            character_count: row.get(10)?,
                            keywords: Vec::new(),
                            topics: Vec::new(),
                            content_hash: row.get(13)?,
                            processed: row.get(14)?,
                            created_at: row.get(15)?,
                            updated_at: row.get(16)?,
                        },
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(11)?,
                        row.get::<_, String>(12)?,
                    ))
                },
            )
            .optional()?;

        // JSON columns are decoded outside the row closure so their errors keep their type
        match row {
            Some((mut stored, code_snippets, keywords, topics)) => {
                stored.code_snippets = serde_json::from_str(&code_snippets)?;
                stored.keywords = serde_json::from_str(&keywords)?;
                stored.topics = serde_json::from_str(&topics)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    fn count_content(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl JobTracker for SqliteStorage {
    fn create_job(&mut self, section: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO jobs (section, status, created_at) VALUES (?1, ?2, ?3)",
            params![section, JobStatus::Pending.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_job(&mut self, job_id: i64, update: &JobUpdate) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE jobs SET
                 status = COALESCE(?1, status),
                 total_urls = COALESCE(?2, total_urls),
                 urls_processed = COALESCE(?3, urls_processed),
                 urls_failed = COALESCE(?4, urls_failed),
                 progress_percentage = COALESCE(?5, progress_percentage),
                 items_scraped = COALESCE(?6, items_scraped),
                 started_at = COALESCE(?7, started_at),
                 completed_at = COALESCE(?8, completed_at),
                 error_message = COALESCE(?9, error_message)
             WHERE id = ?10",
            params![
                update.status.map(|s| s.to_db_string()),
                update.total_urls,
                update.urls_processed,
                update.urls_failed,
                update.progress_percentage,
                update.items_scraped,
                to_db_time(update.started_at),
                to_db_time(update.completed_at),
                update.error_message,
                job_id,
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        Ok(())
    }

    fn get_job(&self, job_id: i64) -> StorageResult<Job> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                job_from_row,
            )
            .optional()?
            .ok_or(StorageError::JobNotFound(job_id))
    }

    fn list_jobs(&self, filter: &JobFilter, limit: usize) -> StorageResult<Vec<Job>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR section = ?2)
             ORDER BY id DESC LIMIT ?3",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map(
                params![
                    filter.status.map(|s| s.to_db_string()),
                    filter.section,
                    limit as i64
                ],
                job_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }
}
