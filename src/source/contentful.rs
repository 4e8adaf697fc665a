//! Contentful Sync API client.
//!
//! Thin transport adapter: issues the initial or token-continuation sync
//! request, follows `nextPageUrl` pagination until the API hands back a
//! `nextSyncToken`, and maps the wire items into [`Entry`] /
//! [`DeltaResult`]. Assets are not mirrored; only entries and deleted
//! entries are kept.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ContentSource, DeltaQuery, SourceError};
use crate::config::CacheConfig;
use crate::entry::{DeltaResult, Entry, Locales};

pub struct ContentfulSource {
    client: reqwest::Client,
    sync_url: String,
    access_token: String,
}

impl ContentfulSource {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let sync_url = format!(
            "{}/spaces/{}/environments/{}/sync",
            config.api_url.trim_end_matches('/'),
            config.space,
            config.environment,
        );
        Self {
            client: reqwest::Client::new(),
            sync_url,
            access_token: config.access_token.clone(),
        }
    }

    async fn fetch_page(
        &self,
        url: &str,
        extra: &[(&str, &str)],
    ) -> Result<SyncPage, SourceError> {
        let response = self
            .client
            .get(url)
            .query(&[("access_token", self.access_token.as_str())])
            .query(extra)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<SyncPage>()
            .await
            .map_err(|e| SourceError::Payload(e.to_string()))
    }
}

#[async_trait]
impl ContentSource for ContentfulSource {
    async fn fetch_delta(&self, query: &DeltaQuery) -> Result<DeltaResult, SourceError> {
        let mut delta = DeltaResult::default();

        let mut page = match query {
            DeltaQuery::Initial => {
                self.fetch_page(&self.sync_url, &[("initial", "true")]).await?
            }
            DeltaQuery::Token(token) => {
                self.fetch_page(&self.sync_url, &[("sync_token", token.as_str())])
                    .await?
            }
        };

        loop {
            for item in page.items.drain(..) {
                match item.sys.kind.as_str() {
                    "Entry" => delta.entries.push(item.into_entry()),
                    "DeletedEntry" => delta.deleted_ids.push(item.sys.id),
                    // Assets are out of scope for the mirror
                    _ => {}
                }
            }

            if let Some(token) = page.next_sync_token.take() {
                delta.next_token = token;
                break;
            }

            let Some(next_url) = page.next_page_url.take() else {
                return Err(SourceError::Payload(
                    "sync page carried neither nextSyncToken nor nextPageUrl".to_string(),
                ));
            };
            debug!(url = %next_url, "Following sync pagination");
            page = self.fetch_page(&next_url, &[]).await?;
        }

        Ok(delta)
    }
}

#[derive(Deserialize)]
struct SyncPage {
    #[serde(default)]
    items: Vec<WireItem>,
    #[serde(rename = "nextPageUrl")]
    next_page_url: Option<String>,
    #[serde(rename = "nextSyncToken")]
    next_sync_token: Option<String>,
}

#[derive(Deserialize)]
struct WireItem {
    sys: WireSys,
    #[serde(default)]
    fields: BTreeMap<String, Locales>,
}

impl WireItem {
    fn into_entry(self) -> Entry {
        Entry {
            id: self.sys.id,
            content_type: self.sys.content_type.map(|ct| ct.sys.id),
            fields: self.fields,
        }
    }
}

#[derive(Deserialize)]
struct WireSys {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "contentType", default)]
    content_type: Option<WireTypeEnvelope>,
}

#[derive(Deserialize)]
struct WireTypeEnvelope {
    sys: WireTypeSys,
}

#[derive(Deserialize)]
struct WireTypeSys {
    id: String,
}
