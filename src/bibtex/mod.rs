//! BibTeX import into a document library.
//!
//! Entries keep every field verbatim, with a few cleanups: `date` is split
//! into integer `year`/`month`, `keywords` become `tags`, `author` gets an
//! `author_list`, and `file` entries are resolved next to the `.bib` file.

mod cleanup;
mod import;
mod parser;

use std::path::PathBuf;

use thiserror::Error;

pub use cleanup::{BibtexDocument, clean_entry, clean_ref, split_authors};
pub use import::{BibtexImportOptions, import_bibtex};
pub use parser::{BibtexEntry, BibtexParseResult, parse_bibtex};

/// Errors that stop a BibTeX import.
#[derive(Debug, Error)]
pub enum BibtexError {
    /// The BibTeX file does not exist.
    #[error("BibTeX file not found: {0}\n  Suggestion: Check the path and file name")]
    NotFound(PathBuf),

    /// The file exists but cannot be read as UTF-8 text.
    #[error(
        "failed to read BibTeX file '{path}': {source}\n  Suggestion: Save the file as UTF-8 and check its permissions"
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
