//! BibTeX import driver.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::BibtexError;
use super::cleanup::{clean_entry, sweep_directory};
use super::parser::parse_bibtex;
use crate::library::{AddRequest, DocumentLibrary};
use crate::report::{ImportReport, ItemReport, ItemStatus, ProgressObserver};
use crate::zotero::creators::DEFAULT_AUTHOR_SEPARATOR;

/// Settings for one BibTeX import.
#[derive(Debug, Clone)]
pub struct BibtexImportOptions {
    pub bib_file: PathBuf,
    pub link: bool,
    pub author_separator: String,
}

impl BibtexImportOptions {
    #[must_use]
    pub fn new(bib_file: impl Into<PathBuf>) -> Self {
        Self {
            bib_file: bib_file.into(),
            link: false,
            author_separator: DEFAULT_AUTHOR_SEPARATOR.to_string(),
        }
    }
}

/// Adds every entry of a BibTeX file to `library`.
///
/// # Errors
///
/// Returns [`BibtexError`] when the file is missing or unreadable. Entries
/// that fail to add are recorded in the report.
pub async fn import_bibtex(
    options: &BibtexImportOptions,
    library: &dyn DocumentLibrary,
    progress: &dyn ProgressObserver,
) -> Result<ImportReport, BibtexError> {
    let bib_file = &options.bib_file;
    if !bib_file.is_file() {
        return Err(BibtexError::NotFound(bib_file.clone()));
    }
    let text = fs::read_to_string(bib_file).map_err(|source| BibtexError::Read {
        path: bib_file.clone(),
        source,
    })?;

    let parsed = parse_bibtex(&text);
    for message in &parsed.skipped {
        warn!(file = %bib_file.display(), "{message}");
    }

    let bib_dir = bib_file.parent().unwrap_or_else(|| Path::new("."));
    let total = parsed.entries.len();
    info!(total, file = %bib_file.display(), "Starting BibTeX import");
    progress.started(total);

    let mut report = ImportReport::new();
    for (position, entry) in parsed.entries.iter().enumerate() {
        let index = position + 1;
        let mut document = clean_entry(entry, bib_dir, &options.author_separator);
        if total == 1 {
            document.files = sweep_directory(document.files, bib_file);
        }

        progress.item(index, &document.key);
        info!(
            "[{index:>4}/{total:<4}] Exporting item with ref '{}'",
            document.key
        );

        let request = AddRequest {
            files: &document.files,
            data: &document.data,
            link: options.link,
            folder_name: None,
            subfolder: None,
        };
        let status = match library.add(request).await {
            Ok(added) => ItemStatus::Added {
                folder: added.folder,
            },
            Err(err) => {
                error!(key = %document.key, error = %err, "Failed to add BibTeX entry");
                ItemStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        report.push(ItemReport {
            key: document.key,
            data: Some(document.data),
            status,
        });
    }

    let summary = report.summary();
    info!(
        total = summary.total,
        added = summary.added,
        failed = summary.failed,
        "BibTeX import finished"
    );
    progress.finished(&summary);
    Ok(report)
}
