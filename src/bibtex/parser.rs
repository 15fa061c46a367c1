//! Tolerant BibTeX reader: every `@type{key, field = value, ...}` entry.

use std::collections::BTreeMap;

const IGNORED_BLOCK_TYPES: [&str; 3] = ["comment", "preamble", "string"];

/// One parsed entry, field names lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexEntry {
    /// Lower-cased entry type (`article`, `misc`, ...).
    pub entry_type: String,
    /// Citation key as written.
    pub key: String,
    /// Field values without their outer delimiters. The first occurrence of
    /// a repeated field wins.
    pub fields: BTreeMap<String, String>,
}

/// Entries and skip messages from one BibTeX text.
#[derive(Debug, Clone, Default)]
pub struct BibtexParseResult {
    pub entries: Vec<BibtexEntry>,
    /// Actionable messages for entries that were left out.
    pub skipped: Vec<String>,
    /// Candidate `@...{` blocks seen, ignored blocks included.
    pub total_found: usize,
}

#[derive(Debug)]
enum EntryOutcome {
    Parsed(BibtexEntry),
    Ignore,
    Skip(String),
}

/// Parses all entries in `input`.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn parse_bibtex(input: &str) -> BibtexParseResult {
    let segments = segment_entries(input);
    let mut result = BibtexParseResult {
        total_found: segments.len(),
        ..BibtexParseResult::default()
    };

    for segment in segments {
        match parse_entry(segment) {
            EntryOutcome::Parsed(entry) => result.entries.push(entry),
            EntryOutcome::Ignore => {}
            EntryOutcome::Skip(message) => result.skipped.push(message),
        }
    }
    result
}

/// Splits `input` into `@type{...}` blocks.
///
/// A block whose braces never balance runs up to the next `@` at the start of
/// a line, so one broken entry does not swallow the rest of the file.
fn segment_entries(input: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut pos = 0usize;

    while let Some(offset) = input[pos..].find('@') {
        let start = pos + offset;
        let type_end = input[start + 1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .map_or(input.len(), |i| start + 1 + i);
        let rest = &input[type_end..];
        let open = type_end + (rest.len() - rest.trim_start().len());

        if type_end == start + 1 || !input[open..].starts_with('{') {
            pos = start + 1;
            continue;
        }

        if let Some(close) = closing_brace(input, open) {
            segments.push(input[start..=close].trim());
            pos = close + 1;
            continue;
        }

        let end = next_entry_at_line_start(input, start + 1).unwrap_or(input.len());
        segments.push(input[start..end].trim());
        if end == input.len() {
            break;
        }
        pos = end;
    }

    segments
}

/// Byte index of the brace closing the one at `open`.
fn closing_brace(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (offset, ch) in input[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' if depth == 1 => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn next_entry_at_line_start(input: &str, from: usize) -> Option<usize> {
    input[from..]
        .match_indices('@')
        .map(|(i, _)| from + i)
        .find(|&i| matches!(input[..i].chars().next_back(), Some('\n' | '\r')))
}

fn parse_entry(segment: &str) -> EntryOutcome {
    let Some(body_start) = segment.find('{') else {
        return EntryOutcome::Skip(format!(
            "What: malformed BibTeX entry `{}`. Why: no '{{' after the entry type. Fix: write entries as `@type{{key, field = value}}`.",
            preview(segment)
        ));
    };
    let entry_type = segment[1..body_start].trim().to_ascii_lowercase();
    if IGNORED_BLOCK_TYPES.contains(&entry_type.as_str()) {
        return EntryOutcome::Ignore;
    }

    let Some(body) = segment[body_start + 1..].strip_suffix('}') else {
        return EntryOutcome::Skip(format!(
            "What: malformed BibTeX entry `{}`. Why: the entry is never closed. Fix: balance every '{{' with a '}}'.",
            preview(segment)
        ));
    };

    let (key, fields_raw) = body.split_once(',').unwrap_or((body, ""));
    let key = key.trim();
    if key.is_empty() || key.contains('=') {
        return EntryOutcome::Skip(format!(
            "What: BibTeX entry `{}` has no citation key. Why: the text before the first comma is empty or a field. Fix: add a key, e.g. `@{entry_type}{{smith2020, ...}}`.",
            preview(segment)
        ));
    }

    match parse_fields(fields_raw) {
        Ok(fields) => EntryOutcome::Parsed(BibtexEntry {
            entry_type,
            key: key.to_string(),
            fields,
        }),
        Err(reason) => EntryOutcome::Skip(format!(
            "What: malformed field list in BibTeX entry `{key}`. Why: {reason}. Fix: use `field = {{value}}` or `field = \"value\"` separated by commas."
        )),
    }
}

/// Splits `name = value` pairs at top-level commas.
fn parse_fields(input: &str) -> Result<BTreeMap<String, String>, String> {
    let mut fields = BTreeMap::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' if depth == 0 => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "a '}' has no matching '{'".to_string())?;
            }
            ',' if depth == 0 && !in_quotes => {
                push_field(&current, &mut fields)?;
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if in_quotes {
        return Err("a quoted value is never closed".to_string());
    }
    if depth != 0 {
        return Err("braces in field values do not balance".to_string());
    }
    push_field(&current, &mut fields)?;
    Ok(fields)
}

fn push_field(segment: &str, fields: &mut BTreeMap<String, String>) -> Result<(), String> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Ok(());
    }
    let Some((name, value)) = segment.split_once('=') else {
        return Err(format!("missing '=' in `{segment}`"));
    };
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err("a field has no name".to_string());
    }
    let value = strip_value(value).ok_or_else(|| format!("field `{name}` has no value"))?;
    fields.entry(name).or_insert(value);
    Ok(())
}

/// Removes one level of `{...}` or `"..."` around a value.
fn strip_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .or_else(|| trimmed.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .unwrap_or(trimmed);
    Some(inner.trim().to_string())
}

fn preview(segment: &str) -> String {
    let flat: String = segment
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .take(60)
        .collect();
    if segment.chars().count() > 60 {
        format!("{flat}...")
    } else {
        flat
    }
}
