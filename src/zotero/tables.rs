//! Static Zotero-to-library vocabulary tables.
//!
//! These are fixed lookup tables, built once and passed by reference into the
//! resolvers. Nothing here is configurable at runtime.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Item types that are never exported as standalone documents.
pub const EXCLUDED_ITEM_TYPES: [&str; 3] = ["attachment", "note", "annotation"];

/// Zotero fields dropped from every record.
pub const EXCLUDED_FIELDS: [&str; 4] = ["accessDate", "id", "shortTitle", "attachments"];

/// Attachment content types that are exported, with their usual extension.
pub const SUPPORTED_MIME_TYPES: [(&str, &str); 10] = [
    ("application/vnd.ms-htmlhelp", "chm"),
    ("image/vnd.djvu", "djvu"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/epub+zip", "epub"),
    ("application/x-fictionbook+xml", "fb2"),
    ("application/x-mobipocket-ebook", "mobi"),
    ("application/pdf", "pdf"),
    ("text/rtf", "rtf"),
    ("application/zip", "zip"),
];

const FIELD_NAMES: [(&str, &str); 12] = [
    ("abstractNote", "abstract"),
    ("publicationTitle", "journal"),
    ("bookTitle", "booktitle"),
    ("proceedingsTitle", "booktitle"),
    ("DOI", "doi"),
    ("ISBN", "isbn"),
    ("ISSN", "issn"),
    ("numPages", "pagetotal"),
    ("extra", "note"),
    ("libraryCatalog", "library_catalog"),
    ("journalAbbreviation", "journal_abbreviation"),
    ("seriesTitle", "series"),
];

const ITEM_TYPES: [(&str, &str); 36] = [
    ("annotation", "misc"),
    ("attachment", "misc"),
    ("audioRecording", "audio"),
    ("bill", "legislation"),
    ("blogPost", "online"),
    ("book", "book"),
    ("bookSection", "inbook"),
    ("case", "jurisdiction"),
    ("computerProgram", "software"),
    ("conferencePaper", "inproceedings"),
    ("dictionaryEntry", "inreference"),
    ("document", "misc"),
    ("email", "letter"),
    ("encyclopediaArticle", "inreference"),
    ("film", "video"),
    ("forumPost", "online"),
    ("hearing", "jurisdiction"),
    ("instantMessage", "online"),
    ("interview", "misc"),
    ("journalArticle", "article"),
    ("letter", "letter"),
    ("magazineArticle", "article"),
    ("manuscript", "unpublished"),
    ("map", "misc"),
    ("newspaperArticle", "article"),
    ("note", "misc"),
    ("patent", "patent"),
    ("podcast", "audio"),
    ("preprint", "unpublished"),
    ("presentation", "misc"),
    ("radioBroadcast", "audio"),
    ("report", "report"),
    ("statute", "legislation"),
    ("thesis", "thesis"),
    ("tvBroadcast", "video"),
    ("webpage", "online"),
];

static DEFAULT_MAPPINGS: LazyLock<ZoteroMappings> = LazyLock::new(ZoteroMappings::build);

/// Immutable vocabulary used by the resolvers.
#[derive(Debug)]
pub struct ZoteroMappings {
    excluded_item_types: Vec<&'static str>,
    excluded_fields: Vec<&'static str>,
    supported_mime_types: Vec<&'static str>,
    field_names: HashMap<&'static str, &'static str>,
    item_types: HashMap<&'static str, &'static str>,
}

impl ZoteroMappings {
    /// Returns the process-wide tables.
    #[must_use]
    pub fn standard() -> &'static Self {
        &DEFAULT_MAPPINGS
    }

    fn build() -> Self {
        Self {
            excluded_item_types: EXCLUDED_ITEM_TYPES.to_vec(),
            excluded_fields: EXCLUDED_FIELDS.to_vec(),
            supported_mime_types: SUPPORTED_MIME_TYPES.iter().map(|(mime, _)| *mime).collect(),
            field_names: FIELD_NAMES.into_iter().collect(),
            item_types: ITEM_TYPES.into_iter().collect(),
        }
    }

    /// Item type names filtered out of enumeration and counting.
    #[must_use]
    pub fn excluded_item_types(&self) -> &[&'static str] {
        &self.excluded_item_types
    }

    /// Content types accepted by the attachment query.
    #[must_use]
    pub fn supported_mime_types(&self) -> &[&'static str] {
        &self.supported_mime_types
    }

    #[must_use]
    pub fn is_excluded_field(&self, name: &str) -> bool {
        self.excluded_fields.contains(&name)
    }

    /// Translates a Zotero field name; unknown names pass through unchanged.
    #[must_use]
    pub fn field_name<'a>(&self, zotero_name: &'a str) -> &'a str {
        self.field_names.get(zotero_name).copied().unwrap_or(zotero_name)
    }

    /// Translates a Zotero item type; unknown types pass through unchanged.
    #[must_use]
    pub fn item_type<'a>(&self, zotero_type: &'a str) -> &'a str {
        self.item_types.get(zotero_type).copied().unwrap_or(zotero_type)
    }
}

/// Returns the usual file extension for a supported attachment content type.
#[must_use]
pub fn extension_for_mime_type(mime_type: &str) -> Option<&'static str> {
    SUPPORTED_MIME_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
}

/// Builds `?, ?, ?` for an `IN (...)` clause with `count` bound parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
