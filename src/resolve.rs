// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read-time reference resolution.
//!
//! The inverse of flattening: walk a flat record's fields and locales,
//! fetch every key a [`FieldValue::Marker`] points at, and substitute the
//! referenced records back in place, depth-first across the whole reachable
//! subgraph. Resolution builds a new structure; the stored records are
//! never written back.
//!
//! Links form an arbitrary graph, so each resolution path carries a visited
//! set of entry ids. An id seen twice on one path is substituted as a
//! terminal, still-flattened stub instead of recursing, which guarantees
//! termination on cyclic content.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::entry::{Entry, FieldValue};
use crate::error::CacheError;
use crate::storage::traits::{KeyStore, StorageError};

pub struct Resolver<'a> {
    store: &'a dyn KeyStore,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyStore) -> Self {
        Self { store }
    }

    /// Recursively resolve every flattened reference in the entry.
    ///
    /// The output locale value for a marker is always an ordered list
    /// matching the marker's key order, even for a single target.
    pub async fn resolve(&self, entry: Entry) -> Result<Entry, CacheError> {
        let mut path = HashSet::new();
        path.insert(entry.id.clone());
        self.resolve_on_path(entry, &path).await
    }

    /// Resolve a batch of top-level entries independently and concurrently.
    pub async fn resolve_many(&self, entries: Vec<Entry>) -> Result<Vec<Entry>, CacheError> {
        try_join_all(entries.into_iter().map(|entry| self.resolve(entry))).await
    }

    fn resolve_on_path<'s>(
        &'s self,
        mut entry: Entry,
        path: &'s HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Entry, CacheError>> + Send + 's>> {
        Box::pin(async move {
            // Gather every marker slot first, so all lookups for this call
            // go to the store as one awaited batch.
            let mut slots: Vec<(String, String, Vec<String>)> = Vec::new();
            for (field, locales) in &entry.fields {
                for (locale, value) in locales {
                    if let FieldValue::Marker(keys) = value {
                        slots.push((field.clone(), locale.clone(), keys.clone()));
                    }
                }
            }
            if slots.is_empty() {
                return Ok(entry);
            }

            let fetches = slots
                .iter()
                .flat_map(|(_, _, keys)| keys)
                .map(|key| async move {
                    self.store.get(key).await.map_err(|e| CacheError::StoreRead {
                        key: key.clone(),
                        source: e,
                    })
                });
            let mut fetched = try_join_all(fetches).await?.into_iter();

            // Children are fetched; now expand each one depth-first and
            // substitute the ordered list back into its slot.
            for (field, locale, keys) in slots {
                let mut resolved = Vec::with_capacity(keys.len());
                for key in keys {
                    let value = fetched.next().flatten();
                    resolved.push(self.expand_child(&key, value, path).await?);
                }
                if let Some(locales) = entry.fields.get_mut(&field) {
                    locales.insert(locale, FieldValue::Inline(Value::Array(resolved)));
                }
            }

            Ok(entry)
        })
    }

    /// Expand one fetched child record for substitution.
    async fn expand_child(
        &self,
        key: &str,
        value: Option<Value>,
        path: &HashSet<String>,
    ) -> Result<Value, CacheError> {
        let Some(value) = value else {
            // Can happen inside the token-persist/apply crash window.
            warn!(key, "referenced entry missing from store, substituting null");
            return Ok(Value::Null);
        };

        if value.get("fields").is_none() {
            // Not an entry record; substitute verbatim.
            return Ok(value);
        }

        let child: Entry =
            serde_json::from_value(value.clone()).map_err(|e| CacheError::StoreRead {
                key: key.to_string(),
                source: StorageError::Serialization {
                    key: key.to_string(),
                    detail: e.to_string(),
                },
            })?;

        if path.contains(&child.id) {
            debug!(id = %child.id, "Cycle detected, substituting unresolved stub");
            return Ok(value);
        }

        let mut child_path = path.clone();
        child_path.insert(child.id.clone());
        let resolved = self.resolve_on_path(child, &child_path).await?;

        serde_json::to_value(&resolved).map_err(|e| CacheError::StoreRead {
            key: key.to_string(),
            source: StorageError::Serialization {
                key: key.to_string(),
                detail: e.to_string(),
            },
        })
    }
}
