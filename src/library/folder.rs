//! Folder-per-document library on the local file system.
//!
//! ```text
//! <root>/<subfolder>/<Family_Year_Title>/
//!     info.json
//!     paper.pdf
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::naming::{derive_folder_name, is_plain_relative, sanitize_segment, unique_path};
use super::{AddRequest, AddedDocument, DocumentData, DocumentLibrary, LibraryError};

/// Metadata file written into every document folder.
pub const INFO_FILE_NAME: &str = "info.json";

/// Library rooted at a directory, one folder per document.
#[derive(Debug, Clone)]
pub struct FolderLibrary {
    root: PathBuf,
}

impl FolderLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parent_dir(&self, subfolder: Option<&Path>) -> Result<PathBuf, LibraryError> {
        match subfolder {
            None => Ok(self.root.clone()),
            Some(sub) if is_plain_relative(sub) => Ok(self.root.join(sub)),
            Some(sub) => Err(LibraryError::InvalidFolderName(
                sub.to_string_lossy().into_owned(),
            )),
        }
    }

    fn folder_name(request: &AddRequest<'_>) -> Result<String, LibraryError> {
        match request.folder_name {
            Some(name) => {
                sanitize_segment(name).ok_or_else(|| LibraryError::InvalidFolderName(name.to_string()))
            }
            None => Ok(derive_folder_name(request.data)),
        }
    }

    async fn populate(folder: &Path, request: &AddRequest<'_>) -> Result<(), LibraryError> {
        let mut stored = Vec::with_capacity(request.files.len());
        for source in request.files {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| LibraryError::InvalidFolderName(source.display().to_string()))?;
            let target = unique_path(folder, &name);
            store_file(source, &target, request.link).await?;
            stored.push(
                target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or(name),
            );
        }

        let mut data: DocumentData = request.data.clone();
        data.insert("files".to_string(), serde_json::Value::from(stored));
        write_info(&folder.join(INFO_FILE_NAME), &data).await
    }
}

#[async_trait]
impl DocumentLibrary for FolderLibrary {
    #[instrument(skip(self, request), fields(files = request.files.len(), link = request.link))]
    async fn add(&self, request: AddRequest<'_>) -> Result<AddedDocument, LibraryError> {
        let parent = self.parent_dir(request.subfolder)?;
        let name = Self::folder_name(&request)?;

        fs::create_dir_all(&parent)
            .await
            .map_err(|e| LibraryError::io(&parent, e))?;
        let folder = unique_path(&parent, &name);
        fs::create_dir(&folder)
            .await
            .map_err(|e| LibraryError::io(&folder, e))?;

        if let Err(err) = Self::populate(&folder, &request).await {
            if let Err(cleanup_err) = fs::remove_dir_all(&folder).await {
                warn!(
                    path = %folder.display(),
                    error = %cleanup_err,
                    "Failed to remove partial document folder"
                );
            }
            return Err(err);
        }

        debug!(folder = %folder.display(), "Document added");
        Ok(AddedDocument { folder })
    }
}

async fn store_file(source: &Path, target: &Path, link: bool) -> Result<(), LibraryError> {
    if link {
        return link_file(source, target).await;
    }
    copy_file(source, target).await
}

async fn copy_file(source: &Path, target: &Path) -> Result<(), LibraryError> {
    fs::copy(source, target)
        .await
        .map(|_| ())
        .map_err(|e| LibraryError::io(source, e))
}

#[cfg(unix)]
async fn link_file(source: &Path, target: &Path) -> Result<(), LibraryError> {
    let absolute = fs::canonicalize(source)
        .await
        .map_err(|e| LibraryError::io(source, e))?;
    fs::symlink(&absolute, target)
        .await
        .map_err(|e| LibraryError::io(target, e))
}

#[cfg(not(unix))]
async fn link_file(source: &Path, target: &Path) -> Result<(), LibraryError> {
    warn!(
        path = %source.display(),
        "Symlinks unsupported on this platform, copying instead"
    );
    copy_file(source, target).await
}

async fn write_info(path: &Path, data: &DocumentData) -> Result<(), LibraryError> {
    let mut bytes = serde_json::to_vec_pretty(data)?;
    bytes.push(b'\n');
    fs::write(path, bytes)
        .await
        .map_err(|e| LibraryError::io(path, e))
}
