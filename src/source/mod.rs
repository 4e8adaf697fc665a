//! Remote content source.
//!
//! The cache talks to the remote source through the narrow [`ContentSource`]
//! contract: one delta fetch per sync cycle, in either initial (full
//! snapshot) or token-continuation mode. [`ContentfulSource`] implements it
//! against the Contentful Sync API; tests substitute scripted sources.

pub mod contentful;

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::{DeltaResult, SyncToken};

pub use contentful::ContentfulSource;

/// Which mode the next delta fetch should run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaQuery {
    /// Full snapshot: everything currently published.
    Initial,
    /// Changes since the checkpoint identified by the token.
    Token(SyncToken),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("sync request failed: {0}")]
    Transport(String),
    #[error("remote source returned HTTP {status}")]
    Status { status: u16 },
    #[error("unexpected sync payload: {0}")]
    Payload(String),
}

/// One fetch cycle against the remote source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_delta(&self, query: &DeltaQuery) -> Result<DeltaResult, SourceError>;
}
