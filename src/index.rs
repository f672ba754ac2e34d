//! JSON index of all tutorials.
//!
//! The catalog is written as one pretty-printed array to
//! `<paths.json>/<metadata.index_file>`, one object per page in page id order.
//! Fields without a value are left out, and a `body` field is never emitted
//! even if a page declares one. With `metadata.index_date` each object gains a
//! `date` taken from the source Markdown file's modification time.

use crate::metadata::{Catalog, MetadataRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const BODY_FIELD: &str = "body";
const DATE_FIELD: &str = "date";

/// Modification time of a page's Markdown source as RFC 3339 UTC.
fn source_date(record: &MetadataRecord, source_dir: &Path) -> Option<String> {
    let modified = fs::metadata(record.page.to_path(source_dir, "md"))
        .and_then(|m| m.modified())
        .ok()?;
    let date: DateTime<Utc> = modified.into();
    Some(date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn index_entry(record: &MetadataRecord, source_dir: Option<&Path>) -> Value {
    let mut object: Map<String, Value> = record
        .fields
        .iter()
        .filter(|(key, _)| key.as_str() != BODY_FIELD)
        .filter_map(|(key, value)| Some((key.clone(), Value::String(value.clone()?))))
        .collect();
    if let Some(date) = source_dir.and_then(|dir| source_date(record, dir)) {
        object.insert(DATE_FIELD.to_string(), Value::String(date));
    }
    Value::Object(object)
}

/// Build the index value.
///
/// `source_dir` enables the `date` field; pass `None` to leave it out.
pub fn build_index(catalog: &Catalog, source_dir: Option<&Path>) -> Value {
    Value::Array(
        catalog
            .records
            .iter()
            .map(|record| index_entry(record, source_dir))
            .collect(),
    )
}

/// Write the index to `path`, replacing any previous file.
pub fn write_index(path: &Path, catalog: &Catalog, source_dir: Option<&Path>) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&build_index(catalog, source_dir))?;
    fs::write(path, json)?;
    Ok(())
}
