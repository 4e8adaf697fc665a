//! Reference flattening.
//!
//! Before an entry is persisted, every embedded link array is rewritten
//! into a [`FieldValue::Marker`]: an ordered list of store keys. The result
//! is a flat record safe to serialize verbatim, with no embedded foreign
//! object graphs left inside it.

use crate::entry::{Entry, FieldValue};
use crate::keys;

/// Rewrite every link array in the entry into a flattened marker.
///
/// Key order matches the original link order; callers may depend on it for
/// display order. An empty link array becomes an empty marker rather than
/// being dropped, so "no links" stays distinguishable from "no field".
/// Inline values and pre-existing markers are left untouched. Pure and
/// infallible, so flattening is all-or-nothing per entry.
pub fn flatten(entry: &mut Entry) {
    for locales in entry.fields.values_mut() {
        for value in locales.values_mut() {
            if let FieldValue::Links(links) = value {
                let store_keys = links.iter().map(|link| keys::entry_key(&link.id)).collect();
                *value = FieldValue::Marker(store_keys);
            }
        }
    }
}
