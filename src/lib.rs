//! Sumi-Folio: a section-by-section documentation crawler
//!
//! This crate crawls a documentation site one section at a time, normalizes every
//! page into text, markdown, code snippets and keywords, skips pages whose content
//! has not changed since the last run, and records page-granular progress on a job
//! record that callers poll.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Folio operations
pub type Result<T> = std::result::Result<T, FolioError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::Section;
pub use config::Config;
pub use crawler::{Crawler, PageResult};
pub use state::{Job, JobStatus};
pub use storage::SqliteStorage;
