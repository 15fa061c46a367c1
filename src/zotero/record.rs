//! The normalized per-item record handed to the destination library.

use std::path::PathBuf;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::creators::CreatorGroup;
use super::fields::FieldMap;
use crate::library::DocumentData;

/// Flat metadata for one Zotero item.
///
/// Built fresh per item and never mutated after it is handed to the
/// destination. Serializes as the same flat mapping [`Self::to_data`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Zotero key of the item, carried as `zotero-key`.
    pub key: String,
    /// Destination item type.
    pub item_type: String,
    /// `dateAdded` in the configured time format.
    pub time_added: String,
    /// Resolved attachment files, in attachment order.
    pub files: Vec<PathBuf>,
    pub fields: FieldMap,
    pub creators: CreatorGroup,
    /// `None` when the item has no tags.
    pub tags: Option<Vec<String>>,
    /// Root-first collection names; `None` outside any collection.
    pub collections: Option<Vec<String>>,
}

impl NormalizedRecord {
    /// Renders the record as a flat document mapping.
    ///
    /// Entries are merged in a fixed order: base keys, fields, creators,
    /// tags, collections. A later entry replaces an earlier one with the
    /// same key.
    #[must_use]
    pub fn to_data(&self) -> DocumentData {
        let mut data = DocumentData::new();
        data.insert("zotero-key".to_string(), Value::from(self.key.clone()));
        data.insert("type".to_string(), Value::from(self.item_type.clone()));
        data.insert("time-added".to_string(), Value::from(self.time_added.clone()));
        data.insert(
            "files".to_string(),
            Value::Array(
                self.files
                    .iter()
                    .map(|path| Value::from(path.to_string_lossy().into_owned()))
                    .collect(),
            ),
        );

        for (name, value) in self.fields.iter() {
            data.insert(name.clone(), Value::from(value));
        }
        for (name, value) in self.creators.to_entries() {
            data.insert(name, value);
        }
        if let Some(tags) = &self.tags {
            data.insert("tags".to_string(), Value::from(tags.clone()));
        }
        if let Some(collections) = &self.collections {
            data.insert("collections".to_string(), Value::from(collections.clone()));
        }

        data
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_data().serialize(serializer)
    }
}
