//! Errors that abort a Zotero extraction run.

use std::path::PathBuf;

use thiserror::Error;

use crate::db::DbError;

/// Failures that stop a run before or while enumerating items.
///
/// Problems with a single item never surface here; they are recorded in the
/// run report instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The Zotero data directory does not exist.
    #[error(
        "Zotero library directory not found: {0}\n  Suggestion: Pass the folder that contains zotero.sqlite (often ~/Zotero)"
    )]
    LibraryRootNotFound(PathBuf),

    /// The data directory has no `zotero.sqlite`.
    #[error(
        "Zotero database not found: {0}\n  Suggestion: Check that --library points at the Zotero data directory, not its storage/ folder"
    )]
    DatabaseNotFound(PathBuf),

    /// The destination library directory does not exist.
    #[error(
        "destination library not found: {0}\n  Suggestion: Create the directory first or pass an existing one with --out"
    )]
    DestinationNotFound(PathBuf),

    /// Opening the database failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Counting or listing items failed.
    #[error("failed to enumerate Zotero items: {0}")]
    Enumerate(#[from] sqlx::Error),
}
