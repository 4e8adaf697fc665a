// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache engine: the public surface of the crate.
//!
//! [`ContentfulCache`] owns the two collaborators (the remote source and
//! the key-value store) and drives the delta-synchronization protocol:
//!
//! ```text
//! remote source ──delta──▶ sync() ──flatten──▶ key-value store
//! caller ◀──resolved graph── resolve ◀──read── key-value store
//! ```
//!
//! # Sync protocol
//!
//! The first `sync()` of a process session fetches in initial
//! (full-snapshot) mode; every later call reads the persisted continuation
//! token and fetches the delta since it. The returned token is persisted
//! immediately after each successful fetch, before the delta is applied;
//! within one cycle deletions are applied strictly before insertions, so an
//! id present in both lists ends up present and updated.
//!
//! # Concurrency
//!
//! Exactly one in-flight `sync()` is assumed; callers must serialize sync
//! triggers. Reads are safe to run concurrently once the sync work for
//! their call has completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::entry::{DeltaResult, Entry};
use crate::error::CacheError;
use crate::flatten::flatten;
use crate::keys;
use crate::metrics;
use crate::resolve::Resolver;
use crate::source::{ContentSource, ContentfulSource, DeltaQuery};
use crate::storage::memory::InMemoryStore;
use crate::storage::redis::RedisStore;
use crate::storage::traits::{KeyStore, StorageError};

/// Mirror of a remote content space over a key-value store.
pub struct ContentfulCache {
    source: Arc<dyn ContentSource>,
    store: Arc<dyn KeyStore>,
    /// Whether this session has completed a fetch yet. Initial mode is
    /// per-process; the persisted token is the durable record of progress.
    synced_once: AtomicBool,
}

impl std::fmt::Debug for ContentfulCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentfulCache")
            .field("synced_once", &self.synced_once)
            .finish_non_exhaustive()
    }
}

impl ContentfulCache {
    /// Build a cache from configuration: Contentful source plus a Redis
    /// store, or the in-memory store when no `redis_url` is configured.
    ///
    /// Fails fast with [`CacheError::Configuration`] before any I/O if
    /// required values are missing.
    pub async fn connect(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let source = Arc::new(ContentfulSource::new(&config));
        let store: Arc<dyn KeyStore> = match config.redis_url.as_deref() {
            Some(url) => Arc::new(
                RedisStore::connect(url)
                    .await
                    .map_err(CacheError::StoreConnect)?,
            ),
            None => Arc::new(InMemoryStore::new()),
        };

        Ok(Self::with_parts(source, store))
    }

    /// Build a cache from explicit collaborators.
    #[must_use]
    pub fn with_parts(source: Arc<dyn ContentSource>, store: Arc<dyn KeyStore>) -> Self {
        Self {
            source,
            store,
            synced_once: AtomicBool::new(false),
        }
    }

    /// Run one synchronization cycle against the remote source.
    ///
    /// Safe to call repeatedly; an empty delta is a no-op apart from token
    /// advancement.
    ///
    /// The continuation token is persisted between fetch and apply. A crash
    /// inside that window leaves the token advanced while part of the
    /// previous delta was never applied; the next cycle fetches the *next*
    /// delta and the skipped portion is not replayed. This consistency gap
    /// is accepted in exchange for an unconditional, simple token write.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<(), CacheError> {
        let start = Instant::now();

        let query = if self.synced_once.load(Ordering::Acquire) {
            match self.read_token().await? {
                Some(token) => DeltaQuery::Token(token),
                // Token key lost underneath us; recover with a fresh snapshot.
                None => DeltaQuery::Initial,
            }
        } else {
            DeltaQuery::Initial
        };

        debug!(initial = matches!(query, DeltaQuery::Initial), "Fetching delta");
        let delta = self.source.fetch_delta(&query).await?;

        // Persist the fresh token before any apply work, unconditionally.
        self.store
            .set(keys::SYNC_TOKEN_KEY, &Value::String(delta.next_token.clone()))
            .await
            .map_err(|e| CacheError::StoreWrite {
                key: keys::SYNC_TOKEN_KEY.to_string(),
                source: e,
            })?;
        self.synced_once.store(true, Ordering::Release);

        let DeltaResult {
            entries,
            deleted_ids,
            ..
        } = delta;
        let (entry_count, deleted_count) = (entries.len(), deleted_ids.len());

        // Deletions strictly before insertions: an id in both lists must
        // end the cycle present and updated.
        if !deleted_ids.is_empty() {
            self.handle_deletions(&deleted_ids).await?;
        }
        if !entries.is_empty() {
            self.handle_entries(entries).await?;
        }

        metrics::record_sync(entry_count, deleted_count);
        metrics::record_sync_latency(start.elapsed());
        info!(entries = entry_count, deleted = deleted_count, "Sync complete");
        Ok(())
    }

    /// Get one entry with its full reference graph resolved.
    ///
    /// Syncs first, so the served record reflects the latest delta.
    #[tracing::instrument(skip(self))]
    pub async fn get_entry(&self, id: &str) -> Result<Entry, CacheError> {
        self.sync().await?;

        let key = keys::entry_key(id);
        let entry = self
            .load_entry(&key)
            .await?
            .ok_or_else(|| CacheError::NotFound(id.to_string()))?;

        metrics::record_operation("get_entry", "hit");
        Resolver::new(self.store.as_ref()).resolve(entry).await
    }

    /// Get many entries, resolved, after syncing.
    ///
    /// With `ids`, each listed entry is fetched and a missing id is a
    /// [`CacheError::NotFound`]. Without `ids`, every entry under the entry
    /// prefix is returned.
    #[tracing::instrument(skip(self, ids))]
    pub async fn get_entries(&self, ids: Option<&[String]>) -> Result<Vec<Entry>, CacheError> {
        self.sync().await?;

        let entries = match ids {
            Some(ids) => {
                let loads = ids.iter().map(|id| async move {
                    let key = keys::entry_key(id);
                    self.load_entry(&key)
                        .await?
                        .ok_or_else(|| CacheError::NotFound(id.clone()))
                });
                try_join_all(loads).await?
            }
            None => {
                let keys_found = self
                    .store
                    .list_keys(keys::ENTRY_PREFIX)
                    .await
                    .map_err(|e| CacheError::StoreRead {
                        key: keys::ENTRY_PREFIX.to_string(),
                        source: e,
                    })?;

                let loads = keys_found.iter().map(|key| async move {
                    // The codec guards against foreign keys sneaking into
                    // the scan result.
                    let id = keys::entry_id(key)?;
                    self.load_entry(key)
                        .await?
                        .ok_or_else(|| CacheError::NotFound(id.to_string()))
                });
                try_join_all(loads).await?
            }
        };

        metrics::record_operation("get_entries", "hit");
        Resolver::new(self.store.as_ref()).resolve_many(entries).await
    }

    async fn read_token(&self) -> Result<Option<String>, CacheError> {
        let value = self
            .store
            .get(keys::SYNC_TOKEN_KEY)
            .await
            .map_err(|e| CacheError::StoreRead {
                key: keys::SYNC_TOKEN_KEY.to_string(),
                source: e,
            })?;

        match value {
            Some(Value::String(token)) => Ok(Some(token)),
            Some(other) => Err(CacheError::StoreRead {
                key: keys::SYNC_TOKEN_KEY.to_string(),
                source: StorageError::Serialization {
                    key: keys::SYNC_TOKEN_KEY.to_string(),
                    detail: format!("expected a string token, got {}", other),
                },
            }),
            None => Ok(None),
        }
    }

    async fn load_entry(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        let value = self
            .store
            .get(key)
            .await
            .map_err(|e| CacheError::StoreRead {
                key: key.to_string(),
                source: e,
            })?;

        value
            .map(|value| {
                serde_json::from_value(value).map_err(|e| CacheError::StoreRead {
                    key: key.to_string(),
                    source: StorageError::Serialization {
                        key: key.to_string(),
                        detail: e.to_string(),
                    },
                })
            })
            .transpose()
    }

    /// Apply one cycle's deletions as a single awaited batch.
    ///
    /// The store acknowledges each key individually; the error for a
    /// half-applied batch names every key whose deletion failed.
    async fn handle_deletions(&self, deleted_ids: &[String]) -> Result<(), CacheError> {
        let keys_to_delete: Vec<String> =
            deleted_ids.iter().map(|id| keys::entry_key(id)).collect();

        debug!(count = keys_to_delete.len(), "Applying deletions");
        let acks = self.store.delete_many(&keys_to_delete).await;

        let mut failed_keys = Vec::new();
        let mut first_err = None;
        for (key, ack) in keys_to_delete.iter().zip(acks) {
            if let Err(e) = ack {
                warn!(key = %key, error = %e, "Entry delete failed");
                failed_keys.push(key.clone());
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(source) => Err(CacheError::StoreDelete {
                keys: failed_keys,
                source,
            }),
            None => Ok(()),
        }
    }

    /// Flatten and persist one cycle's new/changed entries.
    ///
    /// Writes are issued concurrently and every completion is observed. A
    /// failing entry is logged with its key and does not stop the rest of
    /// the batch, but the cycle still reports the first failure.
    async fn handle_entries(&self, entries: Vec<Entry>) -> Result<(), CacheError> {
        let writes = entries.into_iter().map(|mut entry| async move {
            flatten(&mut entry);
            let key = keys::entry_key(&entry.id);
            let value = serde_json::to_value(&entry).map_err(|e| CacheError::StoreWrite {
                key: key.clone(),
                source: StorageError::Serialization {
                    key: key.clone(),
                    detail: e.to_string(),
                },
            })?;
            self.store
                .set(&key, &value)
                .await
                .map_err(|e| CacheError::StoreWrite {
                    key: key.clone(),
                    source: e,
                })?;
            debug!(key = %key, "Entry stored");
            Ok::<(), CacheError>(())
        });

        let mut first_err = None;
        for result in join_all(writes).await {
            if let Err(e) = result {
                warn!(error = %e, "Entry write failed");
                metrics::record_operation("store_entry", "error");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
