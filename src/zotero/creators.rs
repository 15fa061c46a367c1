//! Creator resolution: per-role author lists and their display strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::db::ZoteroDatabase;

/// Separator placed between formatted names by default.
pub const DEFAULT_AUTHOR_SEPARATOR: &str = "; ";

/// One person attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub given: String,
    pub family: String,
}

impl Creator {
    #[must_use]
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
        }
    }
}

impl From<&Creator> for serde_json::Value {
    fn from(creator: &Creator) -> Self {
        serde_json::json!({"given": creator.given, "family": creator.family})
    }
}

/// Renders creators as the `<role>_list` array.
#[must_use]
pub fn creator_list_value(creators: &[Creator]) -> serde_json::Value {
    serde_json::Value::Array(creators.iter().map(serde_json::Value::from).collect())
}

/// Creators of one role, in the item's explicit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCreators {
    /// Human-readable `Family, Given; Family, Given` string.
    pub display: String,
    pub list: Vec<Creator>,
}

/// Lower-cased role name to the creators holding that role.
///
/// Renders as two document keys per role: `<role>` with the display string
/// and `<role>_list` with the structured list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorGroup(BTreeMap<String, RoleCreators>);

impl CreatorGroup {
    #[must_use]
    pub fn role(&self, role: &str) -> Option<&RoleCreators> {
        self.0.get(role)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Flattens into `<role>` / `<role>_list` entries.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, serde_json::Value)> {
        let mut entries = Vec::with_capacity(self.0.len() * 2);
        for (role, creators) in &self.0 {
            entries.push((role.clone(), serde_json::Value::from(creators.display.clone())));
            entries.push((
                format!("{role}_list"),
                creator_list_value(&creators.list),
            ));
        }
        entries
    }
}

/// Row shape of the creator query.
#[derive(Debug, Clone, FromRow)]
pub struct CreatorRow {
    #[sqlx(rename = "creatorType")]
    pub creator_type: String,
    #[sqlx(rename = "firstName")]
    pub first_name: Option<String>,
    #[sqlx(rename = "lastName")]
    pub last_name: Option<String>,
}

/// Loads the creators of one item grouped by role.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db, separator))]
pub async fn load_creators(
    db: &ZoteroDatabase,
    item_id: i64,
    separator: &str,
) -> Result<CreatorGroup, sqlx::Error> {
    let rows = sqlx::query_as::<_, CreatorRow>(
        "SELECT
             creatorTypes.creatorType AS creatorType,
             creators.firstName AS firstName,
             creators.lastName AS lastName
         FROM creatorTypes, creators, itemCreators
         WHERE itemCreators.itemID = ?
           AND creatorTypes.creatorTypeID = itemCreators.creatorTypeID
           AND creators.creatorID = itemCreators.creatorID
         ORDER BY creatorTypes.creatorType, itemCreators.orderIndex",
    )
    .bind(item_id)
    .fetch_all(db.pool())
    .await?;

    Ok(group_creators(rows, separator))
}

/// Groups rows (already in role, order-index order) by lower-cased role.
#[must_use]
pub fn group_creators(rows: impl IntoIterator<Item = CreatorRow>, separator: &str) -> CreatorGroup {
    let mut by_role: BTreeMap<String, Vec<Creator>> = BTreeMap::new();
    for row in rows {
        by_role
            .entry(row.creator_type.to_lowercase())
            .or_default()
            .push(Creator {
                given: row.first_name.unwrap_or_default(),
                family: row.last_name.unwrap_or_default(),
            });
    }

    CreatorGroup(
        by_role
            .into_iter()
            .map(|(role, list)| {
                let display = format_author_list(&list, separator);
                (role, RoleCreators { display, list })
            })
            .collect(),
    )
}

/// Formats `[{given, family}, ...]` as `Family, Given<sep>Family, Given`.
///
/// Single-field names (institutions, where Zotero leaves the given name empty)
/// render as the family name alone.
#[must_use]
pub fn format_author_list(creators: &[Creator], separator: &str) -> String {
    creators
        .iter()
        .filter_map(|creator| {
            let family = creator.family.trim();
            let given = creator.given.trim();
            match (family.is_empty(), given.is_empty()) {
                (false, false) => Some(format!("{family}, {given}")),
                (false, true) => Some(family.to_string()),
                (true, false) => Some(given.to_string()),
                (true, true) => None,
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}
