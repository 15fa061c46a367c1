//! Library that only reports what would be added.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use super::naming::{derive_folder_name, sanitize_segment};
use super::{AddRequest, AddedDocument, DocumentData, DocumentLibrary, LibraryError};

#[derive(Debug, Serialize)]
struct PlannedDocument<'a> {
    folder: String,
    link: bool,
    files: Vec<String>,
    data: &'a DocumentData,
}

/// Writes one JSON line per document instead of touching the file system.
#[derive(Debug)]
pub struct DryRunLibrary<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> DryRunLibrary<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the writer.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Rejected`] if a writer panicked while holding
    /// the lock.
    pub fn into_inner(self) -> Result<W, LibraryError> {
        self.out
            .into_inner()
            .map_err(|e| LibraryError::Rejected(format!("dry-run output poisoned: {e}")))
    }
}

#[async_trait]
impl<W: Write + Send> DocumentLibrary for DryRunLibrary<W> {
    async fn add(&self, request: AddRequest<'_>) -> Result<AddedDocument, LibraryError> {
        let name = match request.folder_name {
            Some(name) => sanitize_segment(name)
                .ok_or_else(|| LibraryError::InvalidFolderName(name.to_string()))?,
            None => derive_folder_name(request.data),
        };
        let folder = request
            .subfolder
            .map_or_else(|| PathBuf::from(&name), |sub| sub.join(&name));

        let planned = PlannedDocument {
            folder: folder.to_string_lossy().into_owned(),
            link: request.link,
            files: request
                .files
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
            data: request.data,
        };
        let line = serde_json::to_string(&planned)?;

        let mut out = self
            .out
            .lock()
            .map_err(|e| LibraryError::Rejected(format!("dry-run output poisoned: {e}")))?;
        writeln!(out, "{line}").map_err(|e| LibraryError::io(&folder, e))?;

        Ok(AddedDocument { folder })
    }
}
