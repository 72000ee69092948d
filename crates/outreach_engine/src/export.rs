use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::JsonObject;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub row_count: usize,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot use export folder {path:?}: {message}")]
    Folder { path: PathBuf, message: String },
    #[error("cannot write export: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode rows as json: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes `rows` as a pretty JSON array to `{dir}/{stem}.json`.
pub fn export_json(dir: &Path, stem: &str, rows: &[JsonObject]) -> Result<ExportSummary, ExportError> {
    let mut content = serde_json::to_string_pretty(rows)?;
    content.push('\n');
    let filename = format!("{}.json", sanitize_stem(stem));
    let path = write_export(dir, &filename, content.as_bytes())?;
    Ok(ExportSummary {
        row_count: rows.len(),
        path,
    })
}

/// Writes `rows` as CSV to `{dir}/{stem}.csv`.
pub fn export_csv(dir: &Path, stem: &str, rows: &[JsonObject]) -> Result<ExportSummary, ExportError> {
    let content = csv_document(rows);
    let filename = format!("{}.csv", sanitize_stem(stem));
    let path = write_export(dir, &filename, content.as_bytes())?;
    Ok(ExportSummary {
        row_count: rows.len(),
        path,
    })
}

/// Replaces `{dir}/{filename}` in one rename, creating `dir` when missing.
/// A failed export leaves any earlier file untouched.
fn write_export(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf, ExportError> {
    let folder_error = |message: String| ExportError::Folder {
        path: dir.to_path_buf(),
        message,
    };
    if dir.exists() && !dir.is_dir() {
        return Err(folder_error("not a directory".to_string()));
    }
    fs::create_dir_all(dir).map_err(|err| folder_error(err.to_string()))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|err| folder_error(err.to_string()))?;
    staged.write_all(content)?;
    staged.as_file_mut().sync_all()?;
    let target = dir.join(filename);
    staged.persist(&target).map_err(|err| ExportError::Io(err.error))?;
    Ok(target)
}

/// Header is every field name in first-seen order. Missing cells stay empty.
pub fn csv_document(rows: &[JsonObject]) -> String {
    let mut header: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().map(|name| quote_field(name)));
    for row in rows {
        push_line(
            &mut out,
            header
                .iter()
                .map(|name| quote_field(&cell_text(row.get(*name)))),
        );
    }
    out
}

fn push_line(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn quote_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Replaces characters that are not portable in file names with `_`.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || is_forbidden(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', '.'][..]);
    if cleaned.is_empty() {
        "export".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_keeps_words_and_drops_separators() {
        assert_eq!(sanitize_stem("AI startups in Pakistan_edited"), "AI_startups_in_Pakistan_edited");
        assert_eq!(sanitize_stem("a/b:c"), "a_b_c");
        assert_eq!(sanitize_stem("  ..  "), "export");
    }

    #[test]
    fn quoting_follows_csv_rules() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }
}
