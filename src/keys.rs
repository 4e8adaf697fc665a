//! Deterministic mapping between entry identity and store keys.
//!
//! This module is the single source of truth for the key format. Entry keys
//! live under a fixed prefix so "all entries" is a prefix scan; the sync
//! token uses one well-known key outside that prefix, so the scan never
//! returns it.

use crate::error::CacheError;

/// Prefix for all persisted entry keys.
pub const ENTRY_PREFIX: &str = "contentful:entry:";

/// Well-known key holding the continuation token for the next delta fetch.
pub const SYNC_TOKEN_KEY: &str = "contentful:syncToken";

/// Build the store key for an entry id.
#[must_use]
pub fn entry_key(id: &str) -> String {
    format!("{ENTRY_PREFIX}{id}")
}

/// Recover the entry id from a store key.
///
/// Fails with [`CacheError::MalformedKey`] if the key does not carry the
/// entry prefix.
pub fn entry_id(key: &str) -> Result<&str, CacheError> {
    key.strip_prefix(ENTRY_PREFIX)
        .ok_or_else(|| CacheError::MalformedKey(key.to_string()))
}
