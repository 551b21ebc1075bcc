//! Section discovery
//!
//! Enumerates the documentation pages linked from a section's root page. Only
//! the root is fetched; discovery does not recurse.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::scheduler::{fetch_with_retry, RetryPolicy, SharedRateLimiter};
use crate::url::{is_in_scope, resolve_link};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Where discovered links may point
#[derive(Debug, Clone)]
pub struct DiscoveryScope {
    /// Origin every link is resolved against and must share
    pub site: Url,

    /// Path every link must start with
    pub path_prefix: String,

    /// Maximum number of URLs returned, root included
    pub cap: usize,
}

/// Extracts in-scope links from a root page's HTML
///
/// The root comes first, followed by every distinct in-scope link in document
/// order, at most `scope.cap` URLs in total. The root is kept even when the
/// cap is zero.
///
/// # Example
///
/// ```
/// use sumi_folio::crawler::{extract_links, DiscoveryScope};
/// use url::Url;
///
/// let scope = DiscoveryScope {
///     site: Url::parse("https://developer.mozilla.org").unwrap(),
///     path_prefix: "/en-US/docs/".to_string(),
///     cap: 100,
/// };
/// let html = r#"<a href="/en-US/docs/Web/CSS/color">color</a><a href="/en-US/blog/">blog</a>"#;
/// let urls = extract_links(html, "https://developer.mozilla.org/en-US/docs/Web/CSS", &scope);
/// assert_eq!(
///     urls,
///     vec![
///         "https://developer.mozilla.org/en-US/docs/Web/CSS",
///         "https://developer.mozilla.org/en-US/docs/Web/CSS/color",
///     ]
/// );
/// ```
pub fn extract_links(html: &str, root_url: &str, scope: &DiscoveryScope) -> Vec<String> {
    let cap = scope.cap.max(1);
    let mut urls = vec![root_url.to_string()];
    let mut seen: HashSet<String> = HashSet::from([root_url.to_string()]);

    let Ok(selector) = Selector::parse("a[href]") else {
        return urls;
    };

    let document = Html::parse_document(html);
    for element in document.select(&selector) {
        if urls.len() >= cap {
            break;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(href, &scope.site) else {
            continue;
        };
        if !is_in_scope(&url, &scope.site, &scope.path_prefix) {
            continue;
        }

        let url = url.to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls.truncate(cap);
    urls
}

/// Fetches the root page and returns the section's URLs
///
/// An unreachable root degrades to `[root_url]`; discovery never fails.
pub async fn discover(
    fetcher: &Fetcher,
    limiter: &SharedRateLimiter,
    retry: &RetryPolicy,
    root_url: &str,
    scope: &DiscoveryScope,
) -> Vec<String> {
    match fetch_with_retry(fetcher, limiter, retry, root_url).await {
        Ok(document) => {
            let urls = extract_links(&document.body, root_url, scope);
            tracing::info!("Discovered {} URLs from {}", urls.len(), root_url);
            urls
        }
        Err(e) => {
            tracing::warn!("Discovery degraded to root only: {}", e);
            vec![root_url.to_string()]
        }
    }
}
