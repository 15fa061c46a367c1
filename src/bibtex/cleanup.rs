//! Turns parsed BibTeX entries into document data and file lists.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::parser::BibtexEntry;
use crate::library::DocumentData;
use crate::zotero::creators::{Creator, creator_list_value, format_author_list};

#[allow(clippy::expect_used)]
static KEYWORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("keyword separator regex is valid"));
#[allow(clippy::expect_used)]
static AUTHOR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("author separator regex is valid"));

/// A BibTeX entry ready for the destination library.
#[derive(Debug, Clone, PartialEq)]
pub struct BibtexDocument {
    /// Cleaned citation key.
    pub key: String,
    pub data: DocumentData,
    /// Existing files named by the `file` field.
    pub files: Vec<PathBuf>,
}

/// Builds document data from an entry.
///
/// `bib_dir` anchors relative `file` paths; `separator` joins the rendered
/// author list.
#[must_use]
pub fn clean_entry(entry: &BibtexEntry, bib_dir: &Path, separator: &str) -> BibtexDocument {
    let mut data = DocumentData::new();
    let mut files = Vec::new();

    for (name, value) in &entry.fields {
        match name.as_str() {
            "date" => insert_date_parts(&mut data, value),
            "keywords" => {
                let tags: Vec<Value> = KEYWORD_SEPARATOR
                    .split(value.trim())
                    .filter(|tag| !tag.is_empty())
                    .map(Value::from)
                    .collect();
                data.insert("tags".to_string(), Value::Array(tags));
            }
            "author" => {
                let authors = split_authors(value);
                data.insert(
                    "author".to_string(),
                    Value::from(format_author_list(&authors, separator)),
                );
                data.insert(
                    "author_list".to_string(),
                    creator_list_value(&authors),
                );
            }
            "file" => files = resolve_file_field(value, bib_dir),
            _ => {
                data.entry(name.clone())
                    .or_insert_with(|| Value::from(value.clone()));
            }
        }
    }

    let key = clean_ref(&entry.key);
    data.insert("type".to_string(), Value::from(entry.entry_type.clone()));
    data.insert("ref".to_string(), Value::from(key.clone()));

    BibtexDocument { key, data, files }
}

/// Drops characters a reference cannot carry.
#[must_use]
pub fn clean_ref(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'))
        .collect()
}

/// Splits `date` on `-` into integer `year` and `month`.
fn insert_date_parts(data: &mut DocumentData, date: &str) {
    let mut parts = date.trim().split('-');

    if let Some(year) = parts.next().filter(|p| !p.is_empty()) {
        match year.trim().parse::<i64>() {
            Ok(year) => {
                data.insert("year".to_string(), Value::from(year));
            }
            Err(_) => warn!(value = year, "Invalid year in date field"),
        }
    }
    if let Some(month) = parts.next().filter(|p| !p.is_empty()) {
        match month.trim().parse::<i64>() {
            Ok(month) => {
                data.insert("month".to_string(), Value::from(month));
            }
            Err(_) => warn!(value = month, "Invalid month in date field"),
        }
    }
}

/// Splits `A and B and C` into creators.
///
/// Each name is `Family, Given` or `Given Family`; braces are dropped.
#[must_use]
pub fn split_authors(value: &str) -> Vec<Creator> {
    AUTHOR_SEPARATOR
        .split(value.trim())
        .map(|name| name.replace(['{', '}'], ""))
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|name| !name.is_empty())
        .map(|name| match name.split_once(',') {
            Some((family, given)) => Creator::new(given.trim(), family.trim()),
            None => match name.rsplit_once(' ') {
                Some((given, family)) => Creator::new(given, family),
                None => Creator::new("", name.as_str()),
            },
        })
        .collect()
}

/// Resolves a semicolon-separated `file` field to existing paths.
#[must_use]
pub fn resolve_file_field(value: &str, bib_dir: &Path) -> Vec<PathBuf> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let path = PathBuf::from(file_entry_path(entry));
            let path = if path.is_absolute() {
                path
            } else {
                bib_dir.join(path)
            };
            if path.exists() {
                debug!(path = %path.display(), "Document file found");
                Some(path)
            } else {
                warn!(path = %path.display(), "Document file not found");
                None
            }
        })
        .collect()
}

/// Path part of a JabRef `description:path:type` entry, or the entry itself.
fn file_entry_path(entry: &str) -> &str {
    let parts: Vec<&str> = entry.split(':').collect();
    if parts.len() < 2 {
        return entry;
    }

    if cfg!(windows) {
        let is_drive = |part: &str| part.len() == 1 && part.chars().all(|c| c.is_ascii_alphabetic());
        if is_drive(parts[0]) {
            return entry;
        }
        if is_drive(parts[1]) {
            return entry.split_once(':').map_or(entry, |(_, rest)| rest);
        }
    }
    parts[1]
}

/// Adds every other regular file next to the BibTeX file, in name order.
///
/// Files whose name matches one already listed, and the BibTeX file itself,
/// are left out.
#[must_use]
pub fn sweep_directory(mut files: Vec<PathBuf>, bib_file: &Path) -> Vec<PathBuf> {
    let dir = match bib_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let listed: Vec<_> = files.iter().filter_map(|f| f.file_name().map(ToOwned::to_owned)).collect();

    let Ok(read_dir) = fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "Cannot list BibTeX directory");
        return files;
    };
    let mut extra: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| Some(name) != bib_file.file_name() && !listed.iter().any(|l| l == name))
        })
        .collect();
    extra.sort();
    files.extend(extra);
    files
}
