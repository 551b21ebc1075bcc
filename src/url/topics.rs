use url::Url;

/// Path segment that marks the documentation tree and carries no topic
const DOCS_SEGMENT: &str = "docs";

/// Derives topic tokens from a page URL
///
/// Topics are the non-empty path segments in order, without the locale segment
/// and without the literal `docs` segment. An unparseable URL has no topics.
///
/// # Examples
///
/// ```
/// use sumi_folio::url::topics_from_url;
///
/// let topics = topics_from_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Element", "en-US");
/// assert_eq!(topics, vec!["Web", "HTML", "Element"]);
/// ```
pub fn topics_from_url(url: &str, locale: &str) -> Vec<String> {
    let Ok(url) = Url::parse(url) else {
        return Vec::new();
    };

    url.path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .filter(|segment| *segment != locale && *segment != DOCS_SEGMENT)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
