//! Configuration module for Sumi-Folio
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional, so an empty file yields the default crawler settings.
//!
//! # Example
//!
//! ```no_run
//! use sumi_folio::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("folio.toml")).unwrap();
//! println!("Batches of {} pages", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
