//! # Contentful Cache
//!
//! Mirrors a remote, paginated, delta-capable Contentful space into a local
//! key-value cache, and makes the cached content navigable as a connected
//! graph even though it is stored as flat key-addressed records.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Remote source (Contentful)              │
//! │  • Initial (full-snapshot) and token-continuation sync   │
//! └──────────────────────────────────────────────────────────┘
//!                              │ delta
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Sync engine                        │
//! │  • Persists the continuation token before applying       │
//! │  • Deletions strictly before insertions per cycle        │
//! └──────────────────────────────────────────────────────────┘
//!                              │ flatten
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │              Key-value store (Redis / memory)            │
//! │  • Flat records under contentful:entry:<id>              │
//! │  • Link arrays replaced by ordered key-list markers      │
//! └──────────────────────────────────────────────────────────┘
//!                              │ resolve (read path)
//!                              ▼
//!                    caller gets the reconstructed graph
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contentful_cache::{CacheConfig, ContentfulCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), contentful_cache::CacheError> {
//!     let config = CacheConfig {
//!         redis_url: Some("redis://localhost:6379".into()),
//!         ..CacheConfig::new("my-space", "my-access-token")
//!     };
//!
//!     let cache = ContentfulCache::connect(config).await?;
//!
//!     // Syncs first, then serves from the cache with references resolved.
//!     let entry = cache.get_entry("4QGBDFjIhGAC0CSOW2QgC4").await?;
//!     println!("{:?}", entry.fields);
//!
//!     let all = cache.get_entries(None).await?;
//!     println!("{} entries mirrored", all.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: [`ContentfulCache`], the sync engine and public surface
//! - [`entry`]: the [`Entry`] / [`FieldValue`] data model
//! - [`flatten`]: link-array → key-list marker rewriting
//! - [`resolve`]: read-time graph reconstruction with cycle protection
//! - [`storage`]: key-value store backends (Redis, memory)
//! - [`source`]: the remote-source contract and the Contentful client
//! - [`keys`]: the store-key codec

pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod flatten;
pub mod keys;
pub mod metrics;
pub mod resolve;
pub mod retry;
pub mod source;
pub mod storage;

pub use config::CacheConfig;
pub use engine::ContentfulCache;
pub use entry::{DeltaResult, Entry, FieldValue, Link, SyncToken};
pub use error::CacheError;
pub use flatten::flatten;
pub use resolve::Resolver;
pub use retry::RetryConfig;
pub use source::{ContentSource, ContentfulSource, DeltaQuery, SourceError};
pub use storage::{InMemoryStore, KeyStore, RedisStore, StorageError};
