//! `metadata.jsonl` reader: one JSON object per line.

use std::io::BufRead;
use std::path::Path;

use serde_json::Value;

use super::MetadataRow;
use crate::error::AudioFolderError;

/// Parses JSONL bytes into rows. Blank lines are skipped; any other line
/// must be a JSON object.
pub fn parse_jsonl_rows(path: &Path, bytes: &[u8]) -> Result<Vec<MetadataRow>, AudioFolderError> {
    let mut rows = Vec::new();

    for (line_idx, line_res) in bytes.lines().enumerate() {
        let location = format!("line {}", line_idx + 1);
        let parse_error = |message: String| AudioFolderError::MetadataParse {
            path: path.to_path_buf(),
            location: location.clone(),
            message,
        };

        let line = line_res.map_err(|source| parse_error(source.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value =
            serde_json::from_str(&line).map_err(|source| parse_error(source.to_string()))?;
        let Value::Object(values) = value else {
            return Err(parse_error("line is not a JSON object".to_string()));
        };

        rows.push(MetadataRow { location, values });
    }

    Ok(rows)
}

/// Parses JSONL bytes without a backing file.
///
/// Useful for fuzzing and for callers that already hold the bytes.
pub fn from_jsonl_slice(bytes: &[u8]) -> Result<Vec<MetadataRow>, AudioFolderError> {
    parse_jsonl_rows(Path::new("<memory>"), bytes)
}
