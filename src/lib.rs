//! Zotero Import Library
//!
//! Reads a Zotero data directory (its `zotero.sqlite` and `storage/` tree)
//! read-only and turns every bibliographic item into a flat, normalized
//! record that a document library can ingest. BibTeX files can be imported
//! into the same library.
//!
//! # Architecture
//!
//! - [`db`] - Read-only access to the Zotero SQLite database
//! - [`zotero`] - Resolvers for fields, creators, attachments, tags and
//!   collections, and the extraction driver
//! - [`library`] - The destination: `DocumentLibrary` trait with folder-backed
//!   and dry-run implementations
//! - [`bibtex`] - BibTeX parsing, field cleanup and import
//! - [`report`] - Per-item outcomes and run summaries
//! - [`config`] - Optional TOML configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bibtex;
pub mod config;
pub mod db;
pub mod library;
pub mod report;
pub mod zotero;

// Re-export commonly used types
pub use bibtex::{BibtexError, BibtexImportOptions, import_bibtex};
pub use db::{DbError, ZOTERO_DATABASE_FILE, ZoteroDatabase};
pub use library::{
    AddRequest, AddedDocument, DocumentData, DocumentLibrary, DryRunLibrary, FolderLibrary,
    LibraryError,
};
pub use report::{ImportReport, ItemReport, ItemStatus, NoProgress, ProgressObserver, RunSummary};
pub use zotero::{ExtractError, ExtractOptions, NormalizedRecord, ZoteroReader, extract};
