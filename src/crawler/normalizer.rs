//! Page normalizer
//!
//! Turns a fetched documentation page into a [`PageResult`]: title, bounded
//! main content, a simplified markdown rendering, fenced code snippets, the
//! most frequent keywords and the topics encoded in the page URL.

use crate::config::Config;
use crate::url::topics_from_url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Containers holding the primary content, tried in order
const CONTENT_SELECTORS: &[&str] = &[".main-page-content", "#content", "article"];

/// Title used when the page has neither a heading nor a `<title>`
const UNTITLED: &str = "Untitled";

/// Language recorded for code blocks without a `language-*` class
const PLAINTEXT: &str = "plaintext";

/// A fenced code block found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
}

/// Normalized representation of one crawled page
///
/// A failed page has `success == false`, an `error` message, zero counts and
/// empty sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub success: bool,
    pub url: String,
    pub title: String,

    /// Main text, trimmed and truncated to the configured number of characters
    pub content: String,

    pub markdown: String,
    pub code_snippets: Vec<CodeSnippet>,
    pub word_count: u32,

    /// Length of `content` in characters
    pub character_count: u32,

    /// Most frequent content tokens, most frequent first
    pub keywords: Vec<String>,

    /// URL path segments below the locale and `docs` segments
    pub topics: Vec<String>,

    pub error: Option<String>,
}

impl PageResult {
    /// Builds the result of a page that could not be fetched or parsed
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.into(),
            title: String::new(),
            content: String::new(),
            markdown: String::new(),
            code_snippets: Vec::new(),
            word_count: 0,
            character_count: 0,
            keywords: Vec::new(),
            topics: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Extracts normalized fields from HTML documents
#[derive(Debug, Clone)]
pub struct Normalizer {
    locale: String,
    max_content_chars: usize,
    max_keywords: usize,
}

impl Normalizer {
    pub fn new(locale: impl Into<String>, max_content_chars: usize, max_keywords: usize) -> Self {
        Self {
            locale: locale.into(),
            max_content_chars,
            max_keywords,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.site.locale.clone(),
            config.crawler.max_content_chars,
            config.crawler.max_keywords,
        )
    }

    /// Normalizes one document
    ///
    /// Deterministic in `url` and `html`. Parsing problems produce a failed
    /// [`PageResult`] instead of an error.
    pub fn normalize(&self, url: &str, html: &str) -> PageResult {
        match self.try_normalize(url, html) {
            Ok(page) => page,
            Err(message) => {
                tracing::debug!("Failed to normalize {}: {}", url, message);
                PageResult::failure(url, message)
            }
        }
    }

    fn try_normalize(&self, url: &str, html: &str) -> Result<PageResult, String> {
        let document = Html::parse_document(html);

        let title = extract_title(&document)?;
        let content = self.extract_content(&document)?;
        let markdown = render_markdown(&document)?;
        let code_snippets = extract_code_snippets(&document)?;

        Ok(PageResult {
            success: true,
            url: url.to_string(),
            title,
            word_count: count_u32(content.split_whitespace().count()),
            character_count: count_u32(content.chars().count()),
            keywords: extract_keywords(&content, self.max_keywords),
            topics: topics_from_url(url, &self.locale),
            markdown,
            code_snippets,
            content,
            error: None,
        })
    }

    /// Text of the first non-empty content container, truncated
    fn extract_content(&self, document: &Html) -> Result<String, String> {
        for css in CONTENT_SELECTORS {
            let selector = selector(css)?;
            let text: String = document
                .select(&selector)
                .flat_map(|element| element.text())
                .collect();
            let text = text.trim();

            if !text.is_empty() {
                return Ok(text.chars().take(self.max_content_chars).collect());
            }
        }

        Ok(String::new())
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First `<h1>`, then `<title>`, then [`UNTITLED`]
fn extract_title(document: &Html) -> Result<String, String> {
    for css in ["h1", "title"] {
        let selector = selector(css)?;
        if let Some(title) = document
            .select(&selector)
            .next()
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty())
        {
            return Ok(title);
        }
    }

    Ok(UNTITLED.to_string())
}

/// Language named by a `language-<name>` class on the code block or its `<pre>`
fn infer_language(code: &ElementRef) -> Option<String> {
    let from_class = |element: &ElementRef| {
        element.value().attr("class").and_then(|class| {
            class.split_whitespace().find_map(|token| {
                let name: String = token
                    .strip_prefix("language-")?
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                (!name.is_empty()).then_some(name)
            })
        })
    };

    from_class(code).or_else(|| {
        code.parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| parent.value().name() == "pre")
            .and_then(|pre| from_class(&pre))
    })
}

/// Every non-empty `<pre><code>` block with its language
fn extract_code_snippets(document: &Html) -> Result<Vec<CodeSnippet>, String> {
    let selector = selector("pre code")?;

    Ok(document
        .select(&selector)
        .filter_map(|code| {
            let text = element_text(&code);
            if text.is_empty() {
                return None;
            }
            Some(CodeSnippet {
                language: infer_language(&code).unwrap_or_else(|| PLAINTEXT.to_string()),
                code: text,
            })
        })
        .collect())
}

/// Headings, paragraphs and code blocks in document order
///
/// Blocks are separated by a blank line; empty blocks are skipped.
fn render_markdown(document: &Html) -> Result<String, String> {
    let selector = selector("h1, h2, h3, h4, h5, h6, p, pre code")?;
    let mut blocks = Vec::new();

    for element in document.select(&selector) {
        let text = element_text(&element);
        if text.is_empty() {
            continue;
        }

        let name = element.value().name();
        let block = match name {
            "code" => format!(
                "```{}\n{}\n```",
                infer_language(&element).unwrap_or_default(),
                text
            ),
            "p" => text,
            heading => {
                let level = heading[1..].parse::<usize>().unwrap_or(1);
                format!("{} {}", "#".repeat(level), text)
            }
        };
        blocks.push(block);
    }

    Ok(blocks.join("\n\n"))
}

/// Returns the `max` most frequent tokens longer than three characters
///
/// Tokens are lowercased and split on anything that is not an ASCII letter,
/// digit or underscore. Equal counts keep first-encountered order.
///
/// # Example
///
/// ```
/// use sumi_folio::crawler::extract_keywords;
///
/// let keywords = extract_keywords("test test test data data value", 10);
/// assert_eq!(keywords, vec!["test", "data", "value"]);
/// ```
pub fn extract_keywords(content: &str, max: usize) -> Vec<String> {
    let lowered = content.to_lowercase();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in lowered
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| token.len() > 3)
    {
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max)
        .map(|(token, _)| token.to_string())
        .collect()
}
