//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the crawler's user agent and timeout
//! - GET requests returning the raw document
//! - Error classification into typed fetch failures
//!
//! A fetch is exactly one GET. Retrying is the caller's decision, guided by
//! [`FetchError::is_transient`].

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct Document {
    /// Requested URL
    pub url: String,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Response body decoded as text
    pub body: String,
}

/// A failed fetch, always naming the URL it concerns
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Body { url, .. }
            | Self::Request { url, .. } => url,
        }
    }

    /// Returns true if the same request may succeed when repeated
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | HTTP 5xx | yes |
    /// | HTTP 429 | yes |
    /// | Other non-2xx | no |
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | Body read failure | yes |
    /// | Malformed request | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. } | Self::Connect { .. } | Self::Body { .. } => true,
            Self::Request { .. } => false,
        }
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout applied to every request
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_folio::config::UserAgentConfig;
/// use sumi_folio::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves raw documents over HTTP
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher identifying itself with the configured user agent
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }

    /// Issues a single GET for `url`
    ///
    /// Non-2xx responses and transport errors both become a [`FetchError`].
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(Document {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
