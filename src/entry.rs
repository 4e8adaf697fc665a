//! Entry data model.
//!
//! An [`Entry`] is the unit that flows through the cache: an opaque id plus
//! a field → locale → value map. A field/locale slot is always in exactly
//! one of three states, captured by the [`FieldValue`] sum type:
//!
//! - [`FieldValue::Inline`] — a scalar or nested object, stored verbatim
//! - [`FieldValue::Links`] — an array of raw link references as delivered
//!   by the remote source (identity only, no content)
//! - [`FieldValue::Marker`] — flattening's substitute for a link array: an
//!   ordered list of store keys, resolved back to content on read
//!
//! The wire format round-trips losslessly through JSON. Links keep the
//! Contentful `{"sys": {"type": "Link", ...}}` shape; markers serialize as
//! a single-key `{"redisReferences": [...]}` object. Classification happens
//! at deserialization time, so the flattener and resolver work by pattern
//! match instead of runtime shape inspection.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the flattened-reference marker inside a field.
pub(crate) const MARKER_FIELD: &str = "redisReferences";

/// Opaque continuation cursor returned by the remote source.
pub type SyncToken = String;

/// A raw embedded reference: the target entry's identity, no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
}

impl Link {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Serialize)]
struct LinkWire<'a> {
    sys: LinkSysWire<'a>,
}

#[derive(Serialize)]
struct LinkSysWire<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(rename = "linkType")]
    link_type: &'a str,
    id: &'a str,
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LinkWire {
            sys: LinkSysWire {
                kind: "Link",
                link_type: "Entry",
                id: &self.id,
            },
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct LinkWireOwned {
    sys: LinkSysOwned,
}

#[derive(Deserialize)]
struct LinkSysOwned {
    id: String,
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = LinkWireOwned::deserialize(deserializer)?;
        Ok(Link { id: wire.sys.id })
    }
}

/// The value of one field/locale slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A scalar or nested object, persisted verbatim.
    Inline(Value),
    /// An array of raw link references (pre-flattening).
    Links(Vec<Link>),
    /// An ordered list of store keys (post-flattening).
    Marker(Vec<String>),
}

impl FieldValue {
    /// Classify a raw JSON value into its field-value state.
    ///
    /// An array is a link array if and only if every element is
    /// link-shaped; this is vacuously true for an empty array, so a
    /// zero-link field stays distinguishable from an absent one all the
    /// way through flatten and resolve.
    fn classify(value: Value) -> Self {
        match value {
            Value::Object(map) if map.len() == 1 && map.contains_key(MARKER_FIELD) => {
                match marker_keys(&map) {
                    Some(keys) => FieldValue::Marker(keys),
                    None => FieldValue::Inline(Value::Object(map)),
                }
            }
            Value::Array(items) if items.iter().all(is_link_shaped) => FieldValue::Links(
                items
                    .into_iter()
                    .map(|item| Link {
                        id: item["sys"]["id"].as_str().unwrap_or_default().to_string(),
                    })
                    .collect(),
            ),
            other => FieldValue::Inline(other),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Inline(value) => value.serialize(serializer),
            FieldValue::Links(links) => links.serialize(serializer),
            FieldValue::Marker(keys) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(MARKER_FIELD, keys)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(FieldValue::classify(value))
    }
}

fn is_link_shaped(value: &Value) -> bool {
    let Some(sys) = value.get("sys") else {
        return false;
    };
    let id_ok = sys.get("id").is_some_and(Value::is_string);
    let kind_ok = match sys.get("type") {
        None => true,
        Some(Value::String(kind)) => kind == "Link",
        Some(_) => false,
    };
    id_ok && kind_ok
}

fn marker_keys(map: &Map<String, Value>) -> Option<Vec<String>> {
    let Some(Value::Array(items)) = map.get(MARKER_FIELD) else {
        return None;
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Locale code → field value.
pub type Locales = BTreeMap<String, FieldValue>;

/// A content entry: identity plus a field/locale map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque id assigned by the remote source.
    pub id: String,
    /// Content-type identity, when the source provides one.
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Field name → locale code → value.
    #[serde(default)]
    pub fields: BTreeMap<String, Locales>,
}

impl Entry {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_type: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set one field/locale slot (builder style).
    #[must_use]
    pub fn with_value(
        mut self,
        field: impl Into<String>,
        locale: impl Into<String>,
        value: FieldValue,
    ) -> Self {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(locale.into(), value);
        self
    }
}

/// One delta fetch cycle's worth of changes.
#[derive(Debug, Clone, Default)]
pub struct DeltaResult {
    /// New or changed entries.
    pub entries: Vec<Entry>,
    /// Ids of entries deleted since the previous checkpoint.
    pub deleted_ids: Vec<String>,
    /// Continuation cursor to persist for the next fetch.
    pub next_token: SyncToken,
}
