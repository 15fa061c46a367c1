//! Builder for small Zotero databases used by unit and integration tests.
//!
//! Only depends on `sqlx` so it can be shared between `src/` unit tests and
//! the `tests/` integration suites.

#![allow(clippy::expect_used, dead_code)]

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const SCHEMA: &str = include_str!("../fixtures/zotero_schema.sql");

/// Writable handle onto a Zotero-shaped database.
pub struct ZoteroFixture {
    pool: SqlitePool,
}

impl ZoteroFixture {
    /// Creates an in-memory database holding the schema.
    pub async fn in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should open");
        Self::with_schema(pool).await
    }

    /// Creates `path` as a new database file holding the schema.
    pub async fn create_file(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("fixture database file should open");
        Self::with_schema(pool).await
    }

    async fn with_schema(pool: SqlitePool) -> Self {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .expect("fixture schema should apply");
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Releases the writer so the file can be reopened read-only.
    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn item_type_id(&self, type_name: &str) -> i64 {
        sqlx::query("INSERT INTO itemTypes (typeName) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM itemTypes WHERE typeName = ?1)")
            .bind(type_name)
            .execute(&self.pool)
            .await
            .expect("insert item type");
        sqlx::query_scalar("SELECT itemTypeID FROM itemTypes WHERE typeName = ?")
            .bind(type_name)
            .fetch_one(&self.pool)
            .await
            .expect("select item type")
    }

    /// Inserts an item row with an explicit identifier.
    pub async fn add_item(&self, item_id: i64, type_name: &str, key: &str, date_added: &str) {
        let type_id = self.item_type_id(type_name).await;
        sqlx::query("INSERT INTO items (itemID, itemTypeID, dateAdded, key) VALUES (?, ?, ?, ?)")
            .bind(item_id)
            .bind(type_id)
            .bind(date_added)
            .bind(key)
            .execute(&self.pool)
            .await
            .expect("insert item");
    }

    /// Sets one field value on an item.
    pub async fn set_field(&self, item_id: i64, field_name: &str, value: &str) {
        sqlx::query("INSERT INTO fields (fieldName) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM fields WHERE fieldName = ?1)")
            .bind(field_name)
            .execute(&self.pool)
            .await
            .expect("insert field");
        sqlx::query("INSERT OR IGNORE INTO itemDataValues (value) VALUES (?)")
            .bind(value)
            .execute(&self.pool)
            .await
            .expect("insert value");
        sqlx::query(
            "INSERT INTO itemData (itemID, fieldID, valueID)
             SELECT ?, fields.fieldID, itemDataValues.valueID
             FROM fields, itemDataValues
             WHERE fields.fieldName = ? AND itemDataValues.value = ?",
        )
        .bind(item_id)
        .bind(field_name)
        .bind(value)
        .execute(&self.pool)
        .await
        .expect("insert item data");
    }

    /// Adds a creator under `role` at position `order_index`.
    pub async fn add_creator(
        &self,
        item_id: i64,
        role: &str,
        first_name: &str,
        last_name: &str,
        order_index: i64,
    ) {
        sqlx::query("INSERT INTO creatorTypes (creatorType) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM creatorTypes WHERE creatorType = ?1)")
            .bind(role)
            .execute(&self.pool)
            .await
            .expect("insert creator type");
        let creator_id = sqlx::query("INSERT INTO creators (firstName, lastName, fieldMode) VALUES (?, ?, 0)")
            .bind(first_name)
            .bind(last_name)
            .execute(&self.pool)
            .await
            .expect("insert creator")
            .last_insert_rowid();
        sqlx::query(
            "INSERT INTO itemCreators (itemID, creatorID, creatorTypeID, orderIndex)
             SELECT ?, ?, creatorTypeID, ? FROM creatorTypes WHERE creatorType = ?",
        )
        .bind(item_id)
        .bind(creator_id)
        .bind(order_index)
        .bind(role)
        .execute(&self.pool)
        .await
        .expect("insert item creator");
    }

    /// Stores `role` as a BLOB, a value no creator row can decode.
    pub async fn corrupt_creator_type(&self, role: &str) {
        sqlx::query("UPDATE creatorTypes SET creatorType = X'FFFE' WHERE creatorType = ?")
            .bind(role)
            .execute(&self.pool)
            .await
            .expect("corrupt creator type");
    }

    /// Adds an attachment item `attachment_id` (with its own `key`) under `parent_id`.
    pub async fn add_attachment(
        &self,
        parent_id: i64,
        attachment_id: i64,
        key: &str,
        content_type: &str,
        path: Option<&str>,
    ) {
        self.add_item(attachment_id, "attachment", key, "2020-01-01 00:00:00")
            .await;
        sqlx::query(
            "INSERT INTO itemAttachments (itemID, parentItemID, linkMode, contentType, path)
             VALUES (?, ?, 0, ?, ?)",
        )
        .bind(attachment_id)
        .bind(parent_id)
        .bind(content_type)
        .bind(path)
        .execute(&self.pool)
        .await
        .expect("insert attachment");
    }

    /// Tags an item, creating the tag on first use.
    pub async fn add_tag(&self, item_id: i64, name: &str) {
        sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .expect("insert tag");
        sqlx::query("INSERT INTO itemTags (itemID, tagID) SELECT ?, tagID FROM tags WHERE name = ?")
            .bind(item_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .expect("insert item tag");
    }

    /// Inserts a collection with an explicit identifier and optional parent.
    pub async fn add_collection(&self, collection_id: i64, name: &str, parent: Option<i64>) {
        sqlx::query(
            "INSERT INTO collections (collectionID, collectionName, parentCollectionID) VALUES (?, ?, ?)",
        )
        .bind(collection_id)
        .bind(name)
        .bind(parent)
        .execute(&self.pool)
        .await
        .expect("insert collection");
    }

    /// Points an existing collection at a new parent.
    pub async fn set_collection_parent(&self, collection_id: i64, parent: Option<i64>) {
        sqlx::query("UPDATE collections SET parentCollectionID = ? WHERE collectionID = ?")
            .bind(parent)
            .bind(collection_id)
            .execute(&self.pool)
            .await
            .expect("update collection parent");
    }

    pub async fn add_to_collection(&self, collection_id: i64, item_id: i64) {
        sqlx::query("INSERT INTO collectionItems (collectionID, itemID) VALUES (?, ?)")
            .bind(collection_id)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .expect("insert collection item");
    }
}
