//! Error taxonomy for the cache.
//!
//! Every public operation returns [`CacheError`]. Low-level storage and
//! transport failures are wrapped with the failing key or entry id attached
//! rather than swallowed, so the caller can decide to log, retry, or abort.

use thiserror::Error;

use crate::source::SourceError;
use crate::storage::traits::StorageError;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Required configuration values are missing. Raised before any I/O.
    #[error("missing required configuration value(s): {0}")]
    Configuration(String),

    /// The delta fetch from the remote source failed. The sync cycle is
    /// aborted with no token or state written.
    #[error("delta fetch from the remote source failed")]
    RemoteFetch(#[from] SourceError),

    /// Connecting to the key-value store failed at startup.
    #[error("failed to connect to the key-value store")]
    StoreConnect(#[source] StorageError),

    /// A key-value store write failed while applying a delta.
    #[error("failed to write '{key}' to the key-value store")]
    StoreWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    /// A key-value store read failed during resolution or sync.
    #[error("failed to read '{key}' from the key-value store")]
    StoreRead {
        key: String,
        #[source]
        source: StorageError,
    },

    /// A deletion batch was only partially applied. Carries every key
    /// whose deletion failed, so the caller knows exactly what is still
    /// present in the store.
    #[error("failed to delete key(s) {keys:?} from the key-value store")]
    StoreDelete {
        keys: Vec<String>,
        #[source]
        source: StorageError,
    },

    /// A store key did not carry the expected entry prefix.
    #[error("malformed store key: '{0}'")]
    MalformedKey(String),

    /// The requested entry is not present in the store.
    #[error("entry '{0}' not found")]
    NotFound(String),
}
