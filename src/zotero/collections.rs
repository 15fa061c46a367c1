//! Collection hierarchy: the folder path of an item, root first.
//!
//! Parent pointers for the whole library are loaded once into a
//! [`CollectionTree`] and walked in memory per item. When an item sits in
//! several collections only the one with the lowest `collectionID` is used.

use std::collections::{HashMap, HashSet};

use sqlx::FromRow;
use tracing::instrument;

use crate::db::ZoteroDatabase;

/// Row shape of the bulk collection query.
#[derive(Debug, Clone, FromRow)]
pub struct CollectionRow {
    #[sqlx(rename = "collectionID")]
    pub id: i64,
    #[sqlx(rename = "collectionName")]
    pub name: String,
    #[sqlx(rename = "parentCollectionID")]
    pub parent: Option<i64>,
}

#[derive(Debug, Clone)]
struct CollectionNode {
    name: String,
    parent: Option<i64>,
}

/// Result of walking from a collection up to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionWalk {
    /// Names from root to the starting collection.
    Path(Vec<String>),
    /// The item belongs to no collection.
    Empty,
    /// The parent chain loops back onto `collection_id`.
    Cycle { collection_id: i64 },
}

impl CollectionWalk {
    /// Returns the path, treating a cycle like no membership.
    #[must_use]
    pub fn into_path(self) -> Option<Vec<String>> {
        match self {
            Self::Path(names) => Some(names),
            Self::Empty | Self::Cycle { .. } => None,
        }
    }
}

/// In-memory parent-pointer index of every collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionTree {
    nodes: HashMap<i64, CollectionNode>,
}

impl CollectionTree {
    /// Loads every collection in one query.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the query fails.
    #[instrument(skip(db))]
    pub async fn load(db: &ZoteroDatabase) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            "SELECT
                 collectionID AS collectionID,
                 CAST(collectionName AS TEXT) AS collectionName,
                 parentCollectionID AS parentCollectionID
             FROM collections",
        )
        .fetch_all(db.pool())
        .await?;

        Ok(Self::from_rows(rows))
    }

    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = CollectionRow>) -> Self {
        Self {
            nodes: rows
                .into_iter()
                .map(|row| {
                    (
                        row.id,
                        CollectionNode {
                            name: row.name,
                            parent: row.parent,
                        },
                    )
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks parent pointers from `start` to the root.
    ///
    /// A parent that does not exist ends the walk like a root would. Names
    /// repeated along the chain are kept once, at their root-most position.
    #[must_use]
    pub fn walk(&self, start: i64) -> CollectionWalk {
        let mut visited = HashSet::new();
        let mut leaf_first = Vec::new();
        let mut current = Some(start);

        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            if !visited.insert(id) {
                return CollectionWalk::Cycle { collection_id: id };
            }
            leaf_first.push(node.name.clone());
            current = node.parent;
        }

        if leaf_first.is_empty() {
            return CollectionWalk::Empty;
        }

        let mut seen = HashSet::new();
        let root_first: Vec<String> = leaf_first
            .into_iter()
            .rev()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        CollectionWalk::Path(root_first)
    }
}

/// Returns the lowest collection identifier the item belongs to.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db))]
pub async fn first_collection(db: &ZoteroDatabase, item_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT c.collectionID
         FROM collections c
         JOIN collectionItems ci ON c.collectionID = ci.collectionID
         WHERE ci.itemID = ?
         ORDER BY c.collectionID
         LIMIT 1",
    )
    .bind(item_id)
    .fetch_optional(db.pool())
    .await
}

/// Resolves the collection path of one item.
///
/// # Errors
///
/// Returns the driver error if the membership query fails.
pub async fn load_collection_path(
    db: &ZoteroDatabase,
    tree: &CollectionTree,
    item_id: i64,
) -> Result<CollectionWalk, sqlx::Error> {
    Ok(match first_collection(db, item_id).await? {
        Some(collection_id) => tree.walk(collection_id),
        None => CollectionWalk::Empty,
    })
}
