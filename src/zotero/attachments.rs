//! Attachment resolution across Zotero's three path conventions.
//!
//! | Stored path            | Resolved to                                  |
//! |------------------------|----------------------------------------------|
//! | `storage:<name>`       | `<library root>/storage/<attachment key>/<name>` |
//! | `attachments:<name>`   | `<attachments dir>/<name>`                   |
//! | anything else          | the path itself, if it exists (linked file)  |

use std::fmt;
use std::path::{Path, PathBuf};

use sqlx::FromRow;
use tracing::{debug, error, instrument, warn};

use super::tables::{ZoteroMappings, extension_for_mime_type, placeholders};
use crate::db::ZoteroDatabase;

const STORAGE_PREFIX: &str = "storage:";
const ATTACHMENTS_PREFIX: &str = "attachments:";
const STORAGE_DIR: &str = "storage";

/// Row shape of the attachment query.
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    /// Key of the attachment item itself (names its storage folder).
    pub key: String,
    pub path: Option<String>,
    #[sqlx(rename = "contentType")]
    pub content_type: String,
}

/// Where attachment files live on disk.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentRoots<'a> {
    /// Zotero data directory holding `storage/`.
    pub library_root: &'a Path,
    /// Base directory for `attachments:` relative paths.
    pub attachments_dir: &'a Path,
}

/// Why an attachment row produced no file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The row has no stored path (e.g. a linked URL).
    MissingPath,
    /// `storage:` path whose file is absent.
    StorageFileMissing(PathBuf),
    /// `attachments:` path whose file is absent.
    AttachmentFileMissing(PathBuf),
    /// Neither prefix matched and the raw path does not exist.
    Unresolved(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPath => write!(f, "path not specified"),
            Self::StorageFileMissing(path) => {
                write!(f, "storage file not found: {}", path.display())
            }
            Self::AttachmentFileMissing(path) => {
                write!(f, "attachment file not found: {}", path.display())
            }
            Self::Unresolved(path) => write!(f, "unresolved attachment path: {path}"),
        }
    }
}

/// Result of resolving one attachment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Resolved(PathBuf),
    Skipped(SkipReason),
}

/// Resolves a single row against the file system.
#[must_use]
pub fn resolve_attachment(row: &AttachmentRow, roots: AttachmentRoots<'_>) -> AttachmentOutcome {
    let Some(path) = row.path.as_deref() else {
        return AttachmentOutcome::Skipped(SkipReason::MissingPath);
    };

    if let Some(name) = path.strip_prefix(STORAGE_PREFIX) {
        let candidate = roots
            .library_root
            .join(STORAGE_DIR)
            .join(&row.key)
            .join(name);
        return if candidate.exists() {
            AttachmentOutcome::Resolved(candidate)
        } else {
            AttachmentOutcome::Skipped(SkipReason::StorageFileMissing(candidate))
        };
    }

    if let Some(name) = path.strip_prefix(ATTACHMENTS_PREFIX) {
        let candidate = roots.attachments_dir.join(name);
        return if candidate.exists() {
            AttachmentOutcome::Resolved(candidate)
        } else {
            AttachmentOutcome::Skipped(SkipReason::AttachmentFileMissing(candidate))
        };
    }

    let linked = PathBuf::from(path);
    if linked.exists() {
        AttachmentOutcome::Resolved(linked)
    } else {
        AttachmentOutcome::Skipped(SkipReason::Unresolved(path.to_string()))
    }
}

/// Loads the supported attachments of one item and resolves them in row order.
///
/// Rows that cannot be resolved are logged and left out.
///
/// # Errors
///
/// Returns the driver error if the query fails.
#[instrument(skip(db, tables, roots))]
pub async fn load_attachments(
    db: &ZoteroDatabase,
    tables: &ZoteroMappings,
    item_id: i64,
    roots: AttachmentRoots<'_>,
) -> Result<Vec<PathBuf>, sqlx::Error> {
    let mime_types = tables.supported_mime_types();
    let sql = format!(
        "SELECT
             items.key AS key,
             itemAttachments.path AS path,
             itemAttachments.contentType AS contentType
         FROM itemAttachments, items
         WHERE itemAttachments.parentItemID = ?
           AND itemAttachments.contentType IN ({})
           AND items.itemID = itemAttachments.itemID
         ORDER BY itemAttachments.itemID",
        placeholders(mime_types.len())
    );

    let mut query = sqlx::query_as::<_, AttachmentRow>(&sql).bind(item_id);
    for mime_type in mime_types {
        query = query.bind(*mime_type);
    }
    let rows = query.fetch_all(db.pool()).await?;

    let mut files = Vec::with_capacity(rows.len());
    for row in &rows {
        debug!(
            key = %row.key,
            mime_type = %row.content_type,
            extension = extension_for_mime_type(&row.content_type).unwrap_or("?"),
            path = row.path.as_deref().unwrap_or(""),
            "Processing attachment"
        );
        match resolve_attachment(row, roots) {
            AttachmentOutcome::Resolved(path) => files.push(path),
            AttachmentOutcome::Skipped(reason @ SkipReason::Unresolved(_)) => {
                error!(
                    key = %row.key,
                    mime_type = %row.content_type,
                    reason = %reason,
                    "Failed to export attachment"
                );
            }
            AttachmentOutcome::Skipped(reason) => {
                warn!(
                    key = %row.key,
                    mime_type = %row.content_type,
                    reason = %reason,
                    "Attachment skipped"
                );
            }
        }
    }

    Ok(files)
}
