//! Discovery against a served root page

use crate::common::{mount_page, root_url, SECTION_PATH};
use std::time::Duration;
use sumi_folio::config::UserAgentConfig;
use sumi_folio::crawler::{discover, DiscoveryScope, Fetcher, RateLimiter, RetryPolicy, SharedRateLimiter};
use url::Url;
use wiremock::MockServer;

fn scope(server: &MockServer, cap: usize) -> DiscoveryScope {
    DiscoveryScope {
        site: Url::parse(&server.uri()).unwrap(),
        path_prefix: "/en-US/docs/".to_string(),
        cap,
    }
}

fn fetcher() -> Fetcher {
    Fetcher::new(&UserAgentConfig::default(), Duration::from_secs(2)).unwrap()
}

fn limiter() -> SharedRateLimiter {
    SharedRateLimiter::new(RateLimiter::new(1_000, 10_000))
}

fn no_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 0,
        backoff_base: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_discovery_is_capped_at_one_hundred() {
    let server = MockServer::start().await;
    let links: String = (0..500)
        .map(|i| format!(r#"<a href="/en-US/docs/Test/item-{}">item</a>"#, i))
        .collect();
    mount_page(&server, SECTION_PATH, 200, format!("<body>{}</body>", links)).await;

    let root = root_url(&server);
    let urls = discover(&fetcher(), &limiter(), &no_retry(), &root, &scope(&server, 100)).await;

    assert_eq!(urls.len(), 100);
    assert_eq!(urls[0], root);
    assert_eq!(urls[1], format!("{}/en-US/docs/Test/item-0", server.uri()));
}

#[tokio::test]
async fn test_unreachable_root_yields_root_only() {
    let server = MockServer::start().await;
    let root = root_url(&server);
    // Nothing mounted: every request gets a 404
    let urls = discover(&fetcher(), &limiter(), &no_retry(), &root, &scope(&server, 100)).await;
    assert_eq!(urls, vec![root]);

    let urls = discover(
        &fetcher(),
        &limiter(),
        &no_retry(),
        "http://127.0.0.1:9/en-US/docs/Test",
        &scope(&server, 100),
    )
    .await;
    assert_eq!(urls, vec!["http://127.0.0.1:9/en-US/docs/Test"]);
}
