use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::traits::{KeyStore, StorageError};

/// In-memory store backed by a concurrent map.
///
/// Used for tests and for running the cache without a Redis backend.
pub struct InMemoryStore {
    data: DashMap<String, Value>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get current key count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clear all keys
    pub fn clear(&self) {
        self.data.clear();
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.data.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .data
            .iter()
            .map(|r| r.key().clone())
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("k1", &json!({"a": 1})).await.unwrap();

        let result = store.get("k1").await.unwrap();
        assert_eq!(result, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = InMemoryStore::new();
        assert!(store.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = InMemoryStore::new();
        store.set("k1", &json!(1)).await.unwrap();
        store.set("k1", &json!(2)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k1").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        store.set("k1", &json!(1)).await.unwrap();

        store.delete("k1").await.unwrap();
        assert!(store.get("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.delete("nonexistent").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_many_via_trait() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.set(&format!("k{}", i), &json!(i)).await.unwrap();
        }

        let keys: Vec<String> = (0..3).map(|i| format!("k{}", i)).collect();
        let acks = store.delete_many(&keys).await;

        assert_eq!(acks.len(), 3);
        assert!(acks.iter().all(Result::is_ok));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_list_keys_filters_by_prefix() {
        let store = InMemoryStore::new();
        store.set("contentful:entry:a", &json!(1)).await.unwrap();
        store.set("contentful:entry:b", &json!(2)).await.unwrap();
        store.set("contentful:syncToken", &json!("T1")).await.unwrap();

        let mut keys = store.list_keys("contentful:entry:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["contentful:entry:a", "contentful:entry:b"]);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for batch in 0..10 {
            let store_clone = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    let key = format!("batch-{}-key-{}", batch, i);
                    store_clone.set(&key, &json!(i)).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 100);
    }
}
