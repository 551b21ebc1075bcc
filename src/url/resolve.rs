use url::Url;

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is dropped so that anchors into the same
/// page resolve to one URL.
///
/// # Examples
///
/// ```
/// use sumi_folio::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://developer.mozilla.org").unwrap();
/// let url = resolve_link("/en-US/docs/Web/HTML#syntax", &base).unwrap();
/// assert_eq!(url.as_str(), "https://developer.mozilla.org/en-US/docs/Web/HTML");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}

/// Checks whether a URL belongs to the documentation tree
///
/// The URL must share the origin (scheme, host and port) of `site` and its path
/// must start with `path_prefix`.
pub fn is_in_scope(url: &Url, site: &Url, path_prefix: &str) -> bool {
    url.origin() == site.origin() && url.path().starts_with(path_prefix)
}
