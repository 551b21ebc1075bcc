//! Integration tests for Sumi-Folio
//!
//! These tests serve documentation sections from wiremock servers and drive
//! whole jobs through the crawler.

mod common;
mod crawl_tests;
mod discovery_tests;
