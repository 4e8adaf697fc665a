use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("stored value for '{key}' failed to round-trip: {detail}")]
    Serialization { key: String, detail: String },
}

/// Uniform async interface over a key-value store.
///
/// Values round-trip through JSON text; the round trip is lossless for the
/// entry, marker, and sync-token shapes the cache persists.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Delete a batch of keys in one round trip where the backend allows.
    ///
    /// Returns one acknowledgement per key, in key order, so a caller can
    /// tell exactly which deletions of a half-applied batch failed.
    /// Default implementation falls back to sequential deletes.
    async fn delete_many(&self, keys: &[String]) -> Vec<Result<(), StorageError>> {
        let mut acks = Vec::with_capacity(keys.len());
        for key in keys {
            acks.push(self.delete(key).await);
        }
        acks
    }

    /// List every key under the given prefix.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
