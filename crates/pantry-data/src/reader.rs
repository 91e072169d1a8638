//! Telemetry export discovery and loading.
//!
//! Reads records that the fetch layer has already written to disk. Accepts a
//! single JSON file (an array of records, or an object wrapping one under
//! `items`), a JSON Lines file, or a directory containing any mix of them.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use pantry_core::error::{PantryError, Result};
use pantry_core::models::RawTelemetryRecord;
use serde_json::Value;
use tracing::{debug, warn};

/// Extensions picked up when walking a directory.
const TELEMETRY_EXTENSIONS: &[&str] = &["json", "jsonl"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` / `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_telemetry_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_telemetry_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every record under `path`.
///
/// A file is loaded directly; a directory is walked with
/// [`find_telemetry_files`] and its files concatenated in path order.
/// Record order is otherwise left as found; the pipeline sorts.
pub fn load_records(path: &Path) -> Result<Vec<RawTelemetryRecord>> {
    if !path.exists() {
        return Err(PantryError::DataPathNotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return load_file(path);
    }

    let files = find_telemetry_files(path);
    if files.is_empty() {
        return Err(PantryError::NoDataFiles(path.to_path_buf()));
    }

    let mut records: Vec<RawTelemetryRecord> = Vec::new();
    for file in &files {
        records.extend(load_file(file)?);
    }

    debug!(
        "Loaded {} records from {} files",
        records.len(),
        files.len()
    );
    Ok(records)
}

/// Load one file, sniffing whether it holds a JSON document or JSON Lines.
pub fn load_file(path: &Path) -> Result<Vec<RawTelemetryRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| PantryError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let is_jsonl = path
        .extension()
        .map(|ext| ext == "jsonl")
        .unwrap_or(false);

    if is_jsonl {
        return Ok(parse_json_lines(path, &content));
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(doc) => records_from_document(doc),
        // A `.json` file that is really JSON Lines.
        Err(_) if looks_like_json_lines(&content) => Ok(parse_json_lines(path, &content)),
        Err(e) => Err(PantryError::JsonParse(e)),
    }
}

/// Extract the record list from a parsed JSON document.
///
/// Accepts a bare array or an object carrying the array under `items`.
pub fn records_from_document(doc: Value) -> Result<Vec<RawTelemetryRecord>> {
    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PantryError::InvalidInput(
                    "object document has no `items` array".to_string(),
                ))
            }
        },
        other => {
            return Err(PantryError::InvalidInput(format!(
                "expected an array of telemetry records, got `{}`",
                other
            )))
        }
    };
    Ok(items.into_iter().map(RawTelemetryRecord::from).collect())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn has_telemetry_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TELEMETRY_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// True when the first non-blank line is a complete JSON value on its own
/// and more lines follow. A broken multi-line document fails this check.
fn looks_like_json_lines(content: &str) -> bool {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some(first) => {
            serde_json::from_str::<Value>(first).is_ok() && lines.next().is_some()
        }
        None => false,
    }
}

/// One record per non-blank line; malformed lines are skipped.
fn parse_json_lines(path: &Path, content: &str) -> Vec<RawTelemetryRecord> {
    let mut records: Vec<RawTelemetryRecord> = Vec::new();
    let mut skipped = 0u64;

    for line in content.as_bytes().lines() {
        let Ok(line) = line else {
            skipped += 1;
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => records.push(RawTelemetryRecord::from(value)),
            Err(e) => {
                skipped += 1;
                debug!("Failed to parse JSON line in {}: {}", path.display(), e);
            }
        }
    }

    debug!(
        "File {}: {} records, {} lines skipped",
        path.display(),
        records.len(),
        skipped
    );
    records
}

// ── Tests ─────────────────────────────────────────────────────────────────────
