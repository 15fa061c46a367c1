//! Field mapping: Zotero `(fieldName, value)` pairs to document fields.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;
use tracing::{debug, instrument};

use super::tables::ZoteroMappings;
use crate::db::ZoteroDatabase;

/// `YYYY[-MM[-DD]]`, matched at the start of the value only.
#[allow(clippy::expect_used)]
static ISO_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<year>[0-9]{4})-?(?P<month>[0-9]{1,2})?-?(?P<day>[0-9]{1,2})?")
        .expect("iso date regex is valid")
});

/// A single document field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Integer(_) => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl From<&FieldValue> for serde_json::Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Self::from(text.as_str()),
            FieldValue::Integer(number) => Self::from(*number),
        }
    }
}

/// Destination-vocabulary fields of one item.
///
/// Never holds an excluded field. A `date` key only survives when the value
/// did not look like `YYYY[-MM[-DD]]`; otherwise it is replaced by integer
/// `year`/`month` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    #[must_use]
    pub fn year(&self) -> Option<i64> {
        self.get("year").and_then(FieldValue::as_integer)
    }

    #[must_use]
    pub fn month(&self) -> Option<i64> {
        self.get("month").and_then(FieldValue::as_integer)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

/// Row shape of the field query.
#[derive(Debug, Clone, FromRow)]
pub struct FieldRow {
    #[sqlx(rename = "fieldName")]
    pub field_name: String,
    pub value: String,
}

/// Loads and maps all fields of one item.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db, tables))]
pub async fn load_fields(
    db: &ZoteroDatabase,
    tables: &ZoteroMappings,
    item_id: i64,
) -> Result<FieldMap, sqlx::Error> {
    let rows = sqlx::query_as::<_, FieldRow>(
        "SELECT
             fields.fieldName AS fieldName,
             CAST(itemDataValues.value AS TEXT) AS value
         FROM fields, itemData, itemDataValues
         WHERE itemData.itemID = ?
           AND fields.fieldID = itemData.fieldID
           AND itemDataValues.valueID = itemData.valueID",
    )
    .bind(item_id)
    .fetch_all(db.pool())
    .await?;

    Ok(map_fields(tables, rows))
}

/// Applies the deny-list, name translation, and date splitting to raw rows.
#[must_use]
pub fn map_fields(tables: &ZoteroMappings, rows: impl IntoIterator<Item = FieldRow>) -> FieldMap {
    let mut fields = BTreeMap::new();
    for row in rows {
        if tables.is_excluded_field(&row.field_name) {
            continue;
        }
        let name = tables.field_name(&row.field_name).to_string();
        fields.insert(name, FieldValue::Text(row.value));
    }

    if let Some(FieldValue::Text(date)) = fields.remove("date") {
        let parts = split_date(&date);
        match parts {
            Some(DateParts { year, month }) => {
                fields.insert("year".to_string(), FieldValue::Integer(year));
                if let Some(month) = month {
                    fields.insert("month".to_string(), FieldValue::Integer(month));
                }
            }
            None => {
                debug!(date = %date, "Date did not match YYYY-MM-DD, keeping it verbatim");
                fields.insert("date".to_string(), FieldValue::Text(date));
            }
        }
    }

    FieldMap(fields)
}

/// Year and optional month extracted from a date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i64,
    pub month: Option<i64>,
}

/// Splits `YYYY[-MM[-DD]]` into year and month; the day is discarded.
///
/// Returns `None` when the value does not start with four digits.
#[must_use]
pub fn split_date(value: &str) -> Option<DateParts> {
    let captures = ISO_DATE_PATTERN.captures(value)?;
    let year = captures.name("year")?.as_str().parse().ok()?;
    let month = captures
        .name("month")
        .and_then(|m| m.as_str().parse().ok());
    Some(DateParts { year, month })
}
