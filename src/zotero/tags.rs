//! Tag names attached to an item.

use tracing::instrument;

use crate::db::ZoteroDatabase;

/// Loads tag names in query order.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db))]
pub async fn load_tags(db: &ZoteroDatabase, item_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT CAST(tags.name AS TEXT)
         FROM tags, itemTags
         WHERE itemTags.itemID = ?
           AND tags.tagID = itemTags.tagID
         ORDER BY itemTags.rowid",
    )
    .bind(item_id)
    .fetch_all(db.pool())
    .await
}
