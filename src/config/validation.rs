use crate::catalog::Section;
use crate::config::types::{Config, CrawlerConfig, SiteConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_sections(&config.sections)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > 50 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 50, got {}",
            config.concurrency
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.discovery_cap < 1 {
        return Err(ConfigError::Validation(
            "discovery_cap must be >= 1".to_string(),
        ));
    }

    if config.rate_limit_per_minute < 1 || config.rate_limit_per_hour < 1 {
        return Err(ConfigError::Validation(format!(
            "rate limits must be >= 1, got {}/min and {}/hour",
            config.rate_limit_per_minute, config.rate_limit_per_hour
        )));
    }

    if config.rate_limit_per_hour < config.rate_limit_per_minute {
        return Err(ConfigError::Validation(format!(
            "rate_limit_per_hour ({}) cannot be lower than rate_limit_per_minute ({})",
            config.rate_limit_per_hour, config.rate_limit_per_minute
        )));
    }

    if config.max_content_chars < 1 {
        return Err(ConfigError::Validation(
            "max_content_chars must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates the crawled site description
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    validate_http_url("base_url", &config.base_url)?;

    if !config.docs_path_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "docs_path_prefix must start with '/', got '{}'",
            config.docs_path_prefix
        )));
    }

    if config.locale.is_empty() || config.locale.contains('/') {
        return Err(ConfigError::Validation(format!(
            "locale must be a single path segment, got '{}'",
            config.locale
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a section catalog override
fn validate_sections(sections: &[Section]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for section in sections {
        validate_slug(&section.slug)?;

        if !seen.insert(section.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate section slug '{}'",
                section.slug
            )));
        }

        if section.title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Section '{}' must have a title",
                section.slug
            )));
        }

        validate_http_url(&format!("section '{}' url", section.slug), &section.url)?;
    }

    Ok(())
}

/// Slugs are URL-safe: lowercase ASCII letters, digits and inner hyphens
fn validate_slug(slug: &str) -> ConfigResult<()> {
    if slug.is_empty() {
        return Err(ConfigError::Validation(
            "Section slug cannot be empty".to_string(),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Section slug '{}' must contain only lowercase letters, digits and hyphens",
            slug
        )));
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "Section slug '{}' cannot start or end with '-'",
            slug
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}
