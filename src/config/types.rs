use crate::catalog::Section;
use serde::Deserialize;

/// Main configuration structure for Sumi-Folio
///
/// Every table is optional; a missing table or key falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Section catalog override; the built-in catalog is used when empty
    #[serde(rename = "section", default)]
    pub sections: Vec<Section>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of pages fetched concurrently within one batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fixed pause between two batches (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Timeout applied to every single fetch (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts for a page whose fetch failed transiently
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff before the first retry, doubled on every further attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "rate-limit-per-minute", default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    #[serde(rename = "rate-limit-per-hour", default = "default_rate_limit_per_hour")]
    pub rate_limit_per_hour: u32,

    /// Maximum number of URLs discovered per section, root included
    #[serde(rename = "discovery-cap", default = "default_discovery_cap")]
    pub discovery_cap: usize,

    /// Maximum stored content length (characters)
    #[serde(rename = "max-content-chars", default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Number of keywords kept per page
    #[serde(rename = "max-keywords", default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_ms: default_delay_ms(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            rate_limit_per_hour: default_rate_limit_per_hour(),
            discovery_cap: default_discovery_cap(),
            max_content_chars: default_max_content_chars(),
            max_keywords: default_max_keywords(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// The documentation site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin used to absolutize relative links, e.g. `https://developer.mozilla.org`
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Locale path segment, dropped from page topics
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Only links whose path starts with this prefix are discovered
    #[serde(rename = "docs-path-prefix", default = "default_docs_path_prefix")]
    pub docs_path_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            docs_path_prefix: default_docs_path_prefix(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_concurrency() -> usize {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_rate_limit_per_minute() -> u32 {
    60
}

fn default_rate_limit_per_hour() -> u32 {
    1000
}

fn default_discovery_cap() -> usize {
    100
}

fn default_max_content_chars() -> usize {
    10_000
}

fn default_max_keywords() -> usize {
    10
}

fn default_crawler_name() -> String {
    "Sumi-Folio".to_string()
}

fn default_crawler_version() -> String {
    "1.0".to_string()
}

fn default_base_url() -> String {
    "https://developer.mozilla.org".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_docs_path_prefix() -> String {
    "/en-US/docs/".to_string()
}

fn default_database_path() -> String {
    "./folio.db".to_string()
}
