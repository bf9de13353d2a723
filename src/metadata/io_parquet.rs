//! `metadata.parquet` reader.
//!
//! This module is feature-gated because Parquet decoding pulls in heavier
//! dependencies than the JSONL and CSV paths. Rows are converted to JSON
//! values so they flow through the same record validation as JSONL.

use std::path::Path;

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value;

use super::MetadataRow;
use crate::error::AudioFolderError;

/// Parses a whole Parquet file held in memory into rows.
pub fn parse_parquet_rows(path: &Path, bytes: Vec<u8>) -> Result<Vec<MetadataRow>, AudioFolderError> {
    let parse_error = |location: &str, message: String| AudioFolderError::MetadataParse {
        path: path.to_path_buf(),
        location: location.to_string(),
        message,
    };

    let reader = SerializedFileReader::new(Bytes::from(bytes))
        .map_err(|source| parse_error("footer", source.to_string()))?;
    let row_iter = reader
        .get_row_iter(None)
        .map_err(|source| parse_error("schema", source.to_string()))?;

    let mut rows = Vec::new();
    for (idx, row_res) in row_iter.enumerate() {
        let location = format!("row {}", idx + 1);
        let row = row_res.map_err(|source| parse_error(&location, source.to_string()))?;
        let Value::Object(values) = row.to_json_value() else {
            return Err(parse_error(&location, "expected a JSON object row".to_string()));
        };
        rows.push(MetadataRow { location, values });
    }

    Ok(rows)
}
