//! URL handling module for Sumi-Folio
//!
//! This module resolves hyperlinks against the documentation site's origin,
//! decides whether a link is inside the documentation tree, and derives topic
//! tokens from page URLs.

mod resolve;
mod topics;

pub use resolve::{is_in_scope, resolve_link};
pub use topics::topics_from_url;
