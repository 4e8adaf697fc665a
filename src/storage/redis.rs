// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis storage backend.
//!
//! Values are stored as JSON text under plain string keys, so the namespace
//! layout (`contentful:entry:<id>`, `contentful:syncToken`) is visible to
//! any Redis client. Deletion batches are pipelined; prefix listing uses a
//! cursor SCAN rather than KEYS so it stays safe on a shared instance.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, pipe, AsyncCommands, Client};
use serde_json::Value;

use super::traits::{KeyStore, StorageError};
use crate::retry::{retry, RetryConfig};

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis, retrying briefly so bad connection strings fail
    /// fast instead of hanging.
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        let client = Client::open(connection_string)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: redis::RedisError| StorageError::Backend(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let conn = self.connection.clone();
        let key_owned = key.to_string();

        let data: Option<String> = retry("redis_get", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key_owned.clone();
            async move {
                let data: Option<String> = conn.get(&key).await?;
                Ok(data)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StorageError::Backend(e.to_string()))?;

        data.map(|text| {
            serde_json::from_str(&text).map_err(|e| StorageError::Serialization {
                key: key.to_string(),
                detail: e.to_string(),
            })
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            detail: e.to_string(),
        })?;

        let conn = self.connection.clone();
        let key_owned = key.to_string();

        retry("redis_set", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key_owned.clone();
            let text = text.clone();
            async move {
                let _: () = conn.set(&key, &text).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StorageError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.connection.clone();
        let key_owned = key.to_string();

        retry("redis_delete", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key_owned.clone();
            async move {
                let _: () = conn.del(&key).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StorageError::Backend(e.to_string()))
    }

    /// Pipelined batch delete: one round trip for the whole batch. The
    /// pipeline succeeds or fails as a unit, so on failure every key in
    /// the batch is acknowledged as failed.
    async fn delete_many(&self, keys: &[String]) -> Vec<Result<(), StorageError>> {
        if keys.is_empty() {
            return Vec::new();
        }

        let conn = self.connection.clone();
        let keys_owned = keys.to_vec();

        let outcome = retry("redis_delete_many", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let keys = keys_owned.clone();
            async move {
                let mut pipeline = pipe();
                for key in &keys {
                    pipeline.del(key);
                }
                pipeline.query_async::<()>(&mut conn).await?;
                Ok(())
            }
        })
        .await;

        match outcome.map_err(|e: redis::RedisError| e.to_string()) {
            Ok(()) => keys.iter().map(|_| Ok(())).collect(),
            Err(detail) => keys
                .iter()
                .map(|_| Err(StorageError::Backend(detail.clone())))
                .collect(),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let conn = self.connection.clone();
        let pattern = format!("{}*", prefix);

        retry("redis_scan", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let pattern = pattern.clone();
            async move {
                let mut keys = Vec::new();
                let mut cursor: u64 = 0;
                loop {
                    let (next, mut batch): (u64, Vec<String>) = cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn)
                        .await?;
                    keys.append(&mut batch);
                    cursor = next;
                    if cursor == 0 {
                        break;
                    }
                }
                Ok(keys)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StorageError::Backend(e.to_string()))
    }
}
