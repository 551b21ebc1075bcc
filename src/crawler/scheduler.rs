//! Request pacing for the crawler
//!
//! This module handles:
//! - Sliding-window request limits per minute and per hour
//! - Retrying transient fetch failures with exponential backoff
//!
//! The fixed delay between batches is applied by the orchestrator, not here.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Document, FetchError, Fetcher};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

/// Small buffer added to computed waits so the window has definitely moved
const WAIT_BUFFER: Duration = Duration::from_millis(10);

/// Sliding-window request counter
///
/// Remembers the instant of every request made during the last hour. A request
/// may be made when fewer than `per_minute` requests happened in the last
/// minute and fewer than `per_hour` in the last hour.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    per_minute: u32,
    per_hour: u32,
    requests: VecDeque<Instant>,
}

impl RateLimiter {
    /// Creates a limiter; a limit of zero is treated as one
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            per_minute: per_minute.max(1),
            per_hour: per_hour.max(1),
            requests: VecDeque::new(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.rate_limit_per_minute, config.rate_limit_per_hour)
    }

    /// Forgets requests older than the hour window
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.requests.front() {
            if now.saturating_duration_since(oldest) >= HOUR {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns how long to wait before the next request, or `None` if one may
    /// be made now
    pub fn time_until_ready(&mut self, now: Instant) -> Option<Duration> {
        self.prune(now);

        let mut wait = Duration::ZERO;

        // Requests of the last minute, oldest first
        let in_minute: Vec<Instant> = self
            .requests
            .iter()
            .copied()
            .filter(|t| now.saturating_duration_since(*t) < MINUTE)
            .collect();
        if in_minute.len() >= self.per_minute as usize {
            let blocking = in_minute[in_minute.len() - self.per_minute as usize];
            wait = wait.max((blocking + MINUTE).saturating_duration_since(now));
        }

        if self.requests.len() >= self.per_hour as usize {
            let blocking = self.requests[self.requests.len() - self.per_hour as usize];
            wait = wait.max((blocking + HOUR).saturating_duration_since(now));
        }

        if wait.is_zero() {
            None
        } else {
            Some(wait)
        }
    }

    /// Records that a request was made at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.requests.push_back(now);
    }

    /// Records a request if both windows have room
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.time_until_ready(now).is_some() {
            return false;
        }
        self.record_request(now);
        true
    }

    /// Number of requests remembered in the hour window
    pub fn recent_requests(&self) -> usize {
        self.requests.len()
    }
}

/// A [`RateLimiter`] shared by every fetch of one crawler
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    inner: Arc<Mutex<RateLimiter>>,
}

impl SharedRateLimiter {
    pub fn new(limiter: RateLimiter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(limiter)),
        }
    }

    /// Waits until a request may be made and records it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut limiter = self.inner.lock().await;
                let now = Instant::now();
                match limiter.time_until_ready(now) {
                    None => {
                        limiter.record_request(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            tracing::debug!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait + WAIT_BUFFER).await;
        }
    }
}

/// How often and how patiently transient fetch failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry; doubled for every further retry
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Fetches `url`, pacing every attempt through the rate limiter
///
/// Transient failures are retried up to `policy.max_retries` times; any other
/// failure, or the last transient one, is returned.
pub async fn fetch_with_retry(
    fetcher: &Fetcher,
    limiter: &SharedRateLimiter,
    policy: &RetryPolicy,
    url: &str,
) -> Result<Document, FetchError> {
    let mut attempt = 0;

    loop {
        limiter.acquire().await;

        match fetcher.fetch(url).await {
            Ok(document) => return Ok(document),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                tracing::debug!(
                    "Transient failure for {} (attempt {}), retrying in {:?}: {}",
                    url,
                    attempt + 1,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
