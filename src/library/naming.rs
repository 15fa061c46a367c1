//! Folder and file naming for library entries.
//!
//! Collection names and metadata become path segments here, so every segment
//! is sanitized: no separators, no `.`/`..`, no reserved device names.

use std::path::{Component, Path, PathBuf};

use super::DocumentData;

/// Maximum characters per folder segment (avoids overly long paths).
pub const MAX_SEGMENT_CHARS: usize = 80;

/// Title characters kept in derived folder names.
const MAX_TITLE_CHARS: usize = 60;

const WINDOWS_RESERVED: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Replaces reserved characters and whitespace runs with a single `-`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::new();
    let mut previous_dash = false;

    for ch in name.trim().chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() || c.is_control() => '-',
            c => c,
        };

        if mapped == '-' {
            if !previous_dash {
                sanitized.push('-');
                previous_dash = true;
            }
        } else {
            sanitized.push(mapped);
            previous_dash = false;
        }
    }

    sanitized.trim_matches('-').to_string()
}

/// Sanitizes one path segment; `None` when nothing usable is left.
#[must_use]
pub fn sanitize_segment(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return None;
    }

    let mut sanitized = sanitize_name(trimmed).trim_matches('.').to_string();
    if is_windows_reserved_name(&sanitized) {
        sanitized.push_str("-folder");
    }
    if sanitized.chars().count() > MAX_SEGMENT_CHARS {
        sanitized = sanitized.chars().take(MAX_SEGMENT_CHARS).collect();
        sanitized = sanitized.trim_matches('-').to_string();
    }

    (!sanitized.is_empty()).then_some(sanitized)
}

fn is_windows_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    WINDOWS_RESERVED
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

/// Joins collection names into a relative subfolder.
///
/// Names that sanitize to nothing are dropped; if none remain the default
/// folder is used.
#[must_use]
pub fn subfolder_from_collections(collections: Option<&[String]>, default: &str) -> PathBuf {
    let segments: Vec<String> = collections
        .unwrap_or_default()
        .iter()
        .filter_map(|name| sanitize_segment(name))
        .collect();

    if segments.is_empty() {
        return PathBuf::from(default);
    }
    segments.iter().collect()
}

/// Returns true when `path` is relative and only has plain segments.
#[must_use]
pub fn is_plain_relative(path: &Path) -> bool {
    path.components().count() > 0
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Derives `Family_Year_Title` from document metadata.
///
/// Falls back to `ref`, then `zotero-key`, then `document` when any of the
/// three parts is missing.
#[must_use]
pub fn derive_folder_name(data: &DocumentData) -> String {
    let author = first_author_family(data).and_then(|family| {
        let cleaned = sanitize_component(&family);
        (!cleaned.is_empty()).then_some(cleaned)
    });
    let year = data.get("year").and_then(|value| match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => {
            let cleaned = sanitize_component(s);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        _ => None,
    });
    let title = data
        .get("title")
        .and_then(serde_json::Value::as_str)
        .and_then(|value| {
            let cleaned = sanitize_component(value);
            if cleaned.is_empty() {
                return None;
            }
            let truncated: String = cleaned.chars().take(MAX_TITLE_CHARS).collect();
            Some(truncated.trim_matches('_').to_string())
        });

    if let (Some(author), Some(year), Some(title)) = (author, year, title) {
        return format!("{author}_{year}_{title}");
    }

    ["ref", "zotero-key"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(serde_json::Value::as_str))
        .map(sanitize_component)
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

fn first_author_family(data: &DocumentData) -> Option<String> {
    let from_list = data
        .get("author_list")
        .and_then(serde_json::Value::as_array)
        .and_then(|list| list.first())
        .and_then(|first| first.get("family"))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|family| !family.is_empty())
        .map(str::to_string);
    if from_list.is_some() {
        return from_list;
    }

    let author = data.get("author").and_then(serde_json::Value::as_str)?;
    let first = author.split(';').next().map_or("", str::trim);
    let family = first.split(',').next().map_or("", str::trim);
    (!family.is_empty()).then(|| family.to_string())
}

/// Reduces a value to `[alnum-_.]` with `_` between words.
pub(crate) fn sanitize_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Returns `dir/name`, or `dir/stem_N.ext` with the first free `N >= 2`.
#[must_use]
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let base_path = dir.join(name);
    if !base_path.exists() && base_path.symlink_metadata().is_err() {
        return base_path;
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    for i in 2..10_000 {
        let candidate = dir.join(format!("{stem}_{i}{ext}"));
        if candidate.symlink_metadata().is_err() {
            return candidate;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}
