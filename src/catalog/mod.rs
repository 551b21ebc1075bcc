//! Static section catalog
//!
//! A section is a URL-rooted subset of the documentation site that is crawled as
//! one unit. The catalog is fixed for the lifetime of the process: either the
//! `[[section]]` tables from the configuration or the built-in catalog below.

use crate::config::{Config, SiteConfig};
use serde::{Deserialize, Serialize};

/// One crawlable section of the documentation site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Human readable name
    pub title: String,

    /// Unique, URL-safe identifier used to trigger crawls
    pub slug: String,

    /// Crawl root
    pub url: String,

    /// Category stored alongside every page of the section
    pub category: String,
}

/// Built-in sections as (title, slug, path below `<locale>/docs/`)
const BUILTIN_SECTIONS: &[(&str, &str, &str)] = &[
    ("HTML", "html", "Web/HTML"),
    ("CSS", "css", "Web/CSS"),
    ("JavaScript", "javascript", "Web/JavaScript"),
    ("Web APIs", "web-apis", "Web/API"),
    ("HTTP", "http", "Web/HTTP"),
    ("Web Guides", "guides", "Web/Guide"),
    ("Developer Tools", "tools", "Tools"),
];

/// Builds the built-in catalog rooted at the configured site
///
/// The slug doubles as the category.
pub fn builtin_sections(site: &SiteConfig) -> Vec<Section> {
    let base = site.base_url.trim_end_matches('/');

    BUILTIN_SECTIONS
        .iter()
        .map(|(title, slug, path)| Section {
            title: title.to_string(),
            slug: slug.to_string(),
            url: format!("{}/{}/docs/{}", base, site.locale, path),
            category: slug.to_string(),
        })
        .collect()
}

/// Returns the effective catalog for a configuration, in catalog order
pub fn list_sections(config: &Config) -> Vec<Section> {
    if config.sections.is_empty() {
        builtin_sections(&config.site)
    } else {
        config.sections.clone()
    }
}

/// Looks up a section by slug
pub fn find_section<'a>(sections: &'a [Section], slug: &str) -> Option<&'a Section> {
    sections.iter().find(|section| section.slug == slug)
}
