//! Item enumeration: which Zotero items become documents.

use sqlx::FromRow;
use tracing::instrument;

use super::tables::{ZoteroMappings, placeholders};
use crate::db::ZoteroDatabase;

/// One extraction target as stored in the `items` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RawItem {
    /// Database-internal identifier, only meaningful within one database.
    #[sqlx(rename = "itemID")]
    pub id: i64,
    /// Zotero item type name, e.g. `journalArticle`.
    #[sqlx(rename = "typeName")]
    pub type_name: String,
    /// Short alphanumeric key, stable within a Zotero library.
    pub key: String,
    /// `YYYY-MM-DD HH:MM:SS` as written by Zotero.
    #[sqlx(rename = "dateAdded")]
    pub date_added: String,
}

/// Counts items whose type is not excluded.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db, tables))]
pub async fn count_items(db: &ZoteroDatabase, tables: &ZoteroMappings) -> Result<i64, sqlx::Error> {
    let excluded = tables.excluded_item_types();
    let sql = format!(
        "SELECT COUNT(item.itemID)
         FROM items item, itemTypes itemType
         WHERE itemType.itemTypeID = item.itemTypeID
           AND itemType.typeName NOT IN ({})",
        placeholders(excluded.len())
    );

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for type_name in excluded {
        query = query.bind(*type_name);
    }
    query.fetch_one(db.pool()).await
}

/// Lists items whose type is not excluded, by ascending internal identifier.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db, tables))]
pub async fn list_items(
    db: &ZoteroDatabase,
    tables: &ZoteroMappings,
) -> Result<Vec<RawItem>, sqlx::Error> {
    let excluded = tables.excluded_item_types();
    let sql = format!(
        "SELECT
             item.itemID AS itemID,
             itemType.typeName AS typeName,
             item.key AS key,
             CAST(item.dateAdded AS TEXT) AS dateAdded
         FROM items item, itemTypes itemType
         WHERE itemType.itemTypeID = item.itemTypeID
           AND itemType.typeName NOT IN ({})
         ORDER BY item.itemID",
        placeholders(excluded.len())
    );

    let mut query = sqlx::query_as::<_, RawItem>(&sql);
    for type_name in excluded {
        query = query.bind(*type_name);
    }
    query.fetch_all(db.pool()).await
}
