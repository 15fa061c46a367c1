//! Destination library: where normalized documents are added.
//!
//! The importers only know the [`DocumentLibrary`] trait. [`FolderLibrary`]
//! stores one folder per document with an `info.json` next to the files;
//! [`DryRunLibrary`] prints what would be added.

mod dry_run;
mod folder;
pub mod naming;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use dry_run::DryRunLibrary;
pub use folder::{FolderLibrary, INFO_FILE_NAME};

/// Flat document metadata, as written to `info.json`.
pub type DocumentData = serde_json::Map<String, serde_json::Value>;

/// One document to add.
#[derive(Debug, Clone, Copy)]
pub struct AddRequest<'a> {
    /// Files to store with the document, in order.
    pub files: &'a [PathBuf],
    pub data: &'a DocumentData,
    /// Symlink files instead of copying them.
    pub link: bool,
    /// Explicit folder name; derived from `data` when `None`.
    pub folder_name: Option<&'a str>,
    /// Relative folder under the library root; the root itself when `None`.
    pub subfolder: Option<&'a Path>,
}

/// A document that was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedDocument {
    /// Folder holding the new entry; identifies it from now on.
    pub folder: PathBuf,
}

/// Errors produced while adding a document.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// File system failure.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be serialized.
    #[error("failed to serialize document metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Folder or subfolder would leave the library root or is empty.
    #[error(
        "invalid folder name '{0}'\n  Suggestion: Use names without '..', leading '/', or only punctuation"
    )]
    InvalidFolderName(String),

    /// The destination refused the document.
    #[error("document rejected: {0}")]
    Rejected(String),
}

impl LibraryError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Destination of imported documents.
///
/// Each call is independent: a failure for one document says nothing about
/// the next.
#[async_trait]
pub trait DocumentLibrary: Send + Sync {
    /// Creates a new entry from `request`.
    async fn add(&self, request: AddRequest<'_>) -> Result<AddedDocument, LibraryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_error_messages() {
        let err = LibraryError::InvalidFolderName("..".to_string());
        assert!(err.to_string().contains("Suggestion"));

        let err = LibraryError::io(
            Path::new("/tmp/x"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/x"));
        assert!(err.to_string().contains("gone"));
    }
}
