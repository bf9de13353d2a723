//! `metadata.csv` reader.
//!
//! CSV carries no types, so each column gets one type inferred from all of
//! its non-empty cells, the way a dataframe reader would: integer if every
//! cell parses as one, then float, then boolean, falling back to string.
//! Empty cells become null. File-reference columns are never inferred: a
//! path like `2024` stays a string.

use std::path::Path;

use serde_json::{Map, Number, Value};

use super::{ColumnKind, MetadataRow};
use crate::error::AudioFolderError;

/// Inferred type of one CSV column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    String,
}

impl CellType {
    fn accepts(self, cell: &str) -> bool {
        match self {
            CellType::Int => cell.parse::<i64>().is_ok(),
            CellType::Float => parse_finite(cell).is_some(),
            CellType::Bool => parse_bool(cell).is_some(),
            CellType::String => true,
        }
    }

    /// Narrowest type that accepts every non-empty cell.
    fn infer<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> Self {
        [CellType::Int, CellType::Float, CellType::Bool]
            .into_iter()
            .find(|candidate| {
                cells
                    .clone()
                    .filter(|cell| !cell.is_empty())
                    .all(|cell| candidate.accepts(cell))
            })
            .unwrap_or(CellType::String)
    }

    fn convert(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        let converted = match self {
            CellType::Int => cell.parse::<i64>().ok().map(Value::from),
            CellType::Float => parse_finite(cell).map(Value::Number),
            CellType::Bool => parse_bool(cell).map(Value::Bool),
            CellType::String => None,
        };
        converted.unwrap_or_else(|| Value::String(cell.to_string()))
    }
}

fn parse_finite(cell: &str) -> Option<Number> {
    cell.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Parses CSV bytes with a header row into rows.
///
/// Records with a different field count than the header are fatal.
pub fn parse_csv_rows(path: &Path, bytes: &[u8]) -> Result<Vec<MetadataRow>, AudioFolderError> {
    let parse_error = |location: String, message: String| AudioFolderError::MetadataParse {
        path: path.to_path_buf(),
        location,
        message,
    };

    let mut csv_reader = csv::Reader::from_reader(bytes);
    let headers = csv_reader
        .headers()
        .map_err(|source| parse_error("header".to_string(), source.to_string()))?
        .clone();

    let mut records = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let location = format!("record {}", idx + 1);
        let record = result.map_err(|source| parse_error(location.clone(), source.to_string()))?;
        records.push((location, record));
    }

    let column_types: Vec<CellType> = headers
        .iter()
        .enumerate()
        .map(|(col, column)| {
            if ColumnKind::parse(column).is_file_reference() {
                CellType::String
            } else {
                CellType::infer(records.iter().map(move |(_, record)| record.get(col).unwrap_or("")))
            }
        })
        .collect();

    let rows = records
        .into_iter()
        .map(|(location, record)| {
            let values: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .zip(&column_types)
                .map(|((column, cell), cell_type)| (column.to_string(), cell_type.convert(cell)))
                .collect();
            MetadataRow { location, values }
        })
        .collect();

    Ok(rows)
}

/// Parses CSV bytes without a backing file.
pub fn from_csv_slice(bytes: &[u8]) -> Result<Vec<MetadataRow>, AudioFolderError> {
    parse_csv_rows(Path::new("<memory>"), bytes)
}
