//! Zotero extraction: read a Zotero SQLite library into normalized records.
//!
//! Each resolver owns one query shape and decodes it into a fixed row type.
//! [`extract()`] ties them together per item and feeds a
//! [`DocumentLibrary`](crate::library::DocumentLibrary).

pub mod attachments;
pub mod collections;
pub mod creators;
mod error;
pub mod extract;
pub mod fields;
pub mod items;
pub mod record;
pub mod tables;
pub mod tags;

#[cfg(test)]
#[path = "../../tests/support/zotero_fixture.rs"]
pub(crate) mod fixture;

pub use attachments::{AttachmentOutcome, SkipReason};
pub use collections::{CollectionTree, CollectionWalk};
pub use creators::{Creator, CreatorGroup, format_author_list};
pub use error::ExtractError;
pub use extract::{
    DEFAULT_SUBFOLDER, DEFAULT_TIME_FORMAT, ExtractOptions, ZoteroReader, extract,
};
pub use fields::{FieldMap, FieldValue};
pub use items::RawItem;
pub use record::NormalizedRecord;
pub use tables::ZoteroMappings;
