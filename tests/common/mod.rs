//! Shared test doubles and builders.
//!
//! `MockSource` hands out scripted deltas and records the queries it was
//! asked for; `FailingStore` wraps the in-memory store and fails writes to
//! configured keys, for exercising the per-entry failure policy.

#![allow(dead_code)] // Not every integration file uses every helper.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use contentful_cache::entry::{DeltaResult, Entry, FieldValue, Link};
use contentful_cache::source::{ContentSource, DeltaQuery, SourceError};
use contentful_cache::storage::{InMemoryStore, KeyStore, StorageError};

/// Install a logging subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scripted content source.
pub struct MockSource {
    deltas: Mutex<VecDeque<DeltaResult>>,
    queries: Mutex<Vec<DeltaQuery>>,
}

impl MockSource {
    pub fn new(deltas: Vec<DeltaResult>) -> Arc<Self> {
        Arc::new(Self {
            deltas: Mutex::new(deltas.into()),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Every query the cache issued, in order.
    pub async fn queries(&self) -> Vec<DeltaQuery> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch_delta(&self, query: &DeltaQuery) -> Result<DeltaResult, SourceError> {
        self.queries.lock().await.push(query.clone());
        self.deltas
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| SourceError::Transport("mock script exhausted".into()))
    }
}

/// In-memory store that fails individual operations for configured keys.
pub struct FailingStore {
    inner: InMemoryStore,
    fail_set_keys: Vec<String>,
    fail_get_keys: Vec<String>,
    fail_delete_keys: Vec<String>,
}

impl FailingStore {
    fn build(set: Vec<String>, get: Vec<String>, delete: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::new(),
            fail_set_keys: set,
            fail_get_keys: get,
            fail_delete_keys: delete,
        })
    }

    pub fn failing_set(keys: Vec<String>) -> Arc<Self> {
        Self::build(keys, vec![], vec![])
    }

    pub fn failing_get(keys: Vec<String>) -> Arc<Self> {
        Self::build(vec![], keys, vec![])
    }

    pub fn failing_delete(keys: Vec<String>) -> Arc<Self> {
        Self::build(vec![], vec![], keys)
    }
}

fn injected(key: &str) -> StorageError {
    StorageError::Backend(format!("injected failure for {key}"))
}

#[async_trait]
impl KeyStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        if self.fail_get_keys.iter().any(|k| k == key) {
            return Err(injected(key));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        if self.fail_set_keys.iter().any(|k| k == key) {
            return Err(injected(key));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_delete_keys.iter().any(|k| k == key) {
            return Err(injected(key));
        }
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list_keys(prefix).await
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn delta(entries: Vec<Entry>, deleted_ids: Vec<&str>, next_token: &str) -> DeltaResult {
    DeltaResult {
        entries,
        deleted_ids: deleted_ids.into_iter().map(String::from).collect(),
        next_token: next_token.to_string(),
    }
}

pub fn scalar_entry(id: &str, title: &str) -> Entry {
    Entry::new(id).with_value("title", "en", FieldValue::Inline(json!(title)))
}

pub fn linked_entry(id: &str, field: &str, targets: &[&str]) -> Entry {
    Entry::new(id).with_value(
        field,
        "en",
        FieldValue::Links(targets.iter().map(|t| Link::new(*t)).collect()),
    )
}
