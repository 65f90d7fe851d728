//! JSON export of prescription records.

use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::models::PrescriptionRecord;

/// Default file name for the standalone export.
pub const DEFAULT_OUTPUT_FILE: &str = "prescription_details.json";

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Serialize a record as a JSON document indented by four spaces.
pub fn to_pretty_json(record: &PrescriptionRecord) -> ExportResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a record to `path` as indented JSON and return the document written.
pub fn write_record<P: AsRef<Path>>(record: &PrescriptionRecord, path: P) -> ExportResult<String> {
    let path = path.as_ref();
    let json = to_pretty_json(record)?;
    fs::write(path, &json).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = json.len(), "Wrote prescription record");
    Ok(json)
}
