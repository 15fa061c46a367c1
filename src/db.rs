//! Read-only access to a Zotero `SQLite` database.
//!
//! Zotero keeps its whole library in `zotero.sqlite` inside the data
//! directory. This module opens that file read-only through a single-connection
//! pool; every resolver borrows the same connection, one query at a time.
//!
//! # Example
//!
//! ```no_run
//! use zotero_import::ZoteroDatabase;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = ZoteroDatabase::open(Path::new("/home/me/Zotero/zotero.sqlite")).await?;
//! // Use db for queries...
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::instrument;

/// File name of the database inside a Zotero data directory.
pub const ZOTERO_DATABASE_FILE: &str = "zotero.sqlite";

/// One connection is enough: extraction is strictly sequential.
const MAX_CONNECTIONS: u32 = 1;

/// How long to wait on a lock held by a running Zotero instance.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database-related errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to open the database file.
    #[error(
        "failed to open Zotero database '{path}': {source}\n  Suggestion: Close Zotero or copy zotero.sqlite elsewhere and retry"
    )]
    Open {
        /// Database path that failed to open.
        path: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}

/// Read-only Zotero database handle.
#[derive(Debug, Clone)]
pub struct ZoteroDatabase {
    pool: SqlitePool,
}

impl ZoteroDatabase {
    /// Opens an existing Zotero database in read-only mode.
    ///
    /// The file is never created and never written to.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] if the file cannot be opened as `SQLite`.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn open(db_path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|source| DbError::Open {
                path: db_path.display().to_string(),
                source,
            })?;

        Ok(Self { pool })
    }

    /// Wraps an already configured pool.
    ///
    /// Used by tests that build a Zotero schema in memory.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Gracefully closes the connection.
    #[instrument(skip(self))]
    pub async fn close(self) {
        self.pool.close().await;
    }
}
