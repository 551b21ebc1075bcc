//! Content-hash change detection
//!
//! Pages are keyed by URL. A page is written when its URL is unseen or its
//! normalized content hashes differently from the stored version.

use sha2::{Digest, Sha256};

/// Hex encoded SHA-256 of normalized page content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// What to do with a successfully normalized page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistDecision {
    /// The URL has never been stored
    Insert,

    /// The URL is stored with a different hash
    Update,

    /// The stored hash matches; nothing to write
    Skip,
}

impl PersistDecision {
    /// Compares the stored hash (if any) with the hash of the new content
    pub fn decide(stored_hash: Option<&str>, new_hash: &str) -> Self {
        match stored_hash {
            None => Self::Insert,
            Some(stored) if stored == new_hash => Self::Skip,
            Some(_) => Self::Update,
        }
    }

    pub fn needs_write(self) -> bool {
        !matches!(self, Self::Skip)
    }
}
