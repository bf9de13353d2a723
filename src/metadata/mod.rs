//! Sidecar metadata loading and the per-split metadata index.
//!
//! Every split may carry any number of whitelisted metadata files
//! (`metadata.jsonl`, `metadata.csv`, `metadata.parquet`), all in one format.
//! Each row names at least one file through a file-reference column:
//! `file_name` itself, or any column ending in `_file_name`. Paths in a row
//! are resolved against the directory of the metadata file that holds it, so
//! metadata inside a zip archive resolves against the archive's layout.

pub mod io_csv;
pub mod io_jsonl;
#[cfg(feature = "parquet")]
pub mod io_parquet;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AudioFolderError;
use crate::files::{AccessMode, FileRef};

/// Column holding the primary media file's path.
pub const FILE_NAME_COLUMN: &str = "file_name";

/// Suffix marking any other file-reference column.
pub const FILE_NAME_SUFFIX: &str = "_file_name";

/// Stem shared by all whitelisted metadata file names.
const METADATA_STEM: &str = "metadata";

/// Sidecar metadata file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataFormat {
    /// Row-delimited JSON objects.
    Jsonl,
    /// Comma-separated values with a header row.
    Csv,
    /// Apache Parquet (requires the `parquet` feature to read).
    Parquet,
}

impl MetadataFormat {
    /// Matches a whitelisted metadata base name, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        let (stem, ext) = lower.rsplit_once('.')?;
        if stem != METADATA_STEM {
            return None;
        }
        match ext {
            "jsonl" => Some(MetadataFormat::Jsonl),
            "csv" => Some(MetadataFormat::Csv),
            "parquet" => Some(MetadataFormat::Parquet),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MetadataFormat::Jsonl => "jsonl",
            MetadataFormat::Csv => "csv",
            MetadataFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// How a metadata column is consumed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnKind {
    /// The bare `file_name` column; maps to the primary media column.
    PrimaryFile,
    /// `<prefix>_file_name`; surfaces as an extra file column named `<prefix>`.
    NamedFile(String),
    /// Any other column, surfaced as-is.
    Plain(String),
}

impl ColumnKind {
    pub fn parse(column: &str) -> Self {
        if column == FILE_NAME_COLUMN {
            return ColumnKind::PrimaryFile;
        }
        match column.strip_suffix(FILE_NAME_SUFFIX) {
            Some(prefix) if !prefix.is_empty() => ColumnKind::NamedFile(prefix.to_string()),
            _ => ColumnKind::Plain(column.to_string()),
        }
    }

    pub fn is_file_reference(&self) -> bool {
        !matches!(self, ColumnKind::Plain(_))
    }
}

/// One parsed row from a metadata file, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRow {
    /// Human-readable row position (`line 3`, `record 2`, `row 5`).
    pub location: String,
    pub values: Map<String, Value>,
}

/// One validated metadata row.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRecord {
    source: FileRef,
    location: String,
    key_column: String,
    key_reference: String,
    plain: BTreeMap<String, Value>,
    /// Output column name -> reference as written (`None` for null).
    extra_files: BTreeMap<String, Option<String>>,
}

impl MetadataRecord {
    /// Validates a row from `source` and splits it into plain columns and
    /// file-reference columns.
    pub fn from_row(source: &FileRef, row: MetadataRow) -> Result<Self, AudioFolderError> {
        let schema_error = |message: String| AudioFolderError::MetadataSchema {
            path: source.display_path(),
            message: format!("{}: {message}", row.location),
        };

        let mut plain = BTreeMap::new();
        let mut extra_files = BTreeMap::new();
        let mut primary: Option<String> = None;
        let mut first_named: Option<(String, String)> = None;

        for (column, value) in &row.values {
            match ColumnKind::parse(column) {
                ColumnKind::Plain(name) => {
                    plain.insert(name, value.clone());
                }
                ColumnKind::PrimaryFile => {
                    let reference = value.as_str().ok_or_else(|| {
                        schema_error(format!("column '{column}' must be a string path"))
                    })?;
                    primary = Some(reference.to_string());
                }
                ColumnKind::NamedFile(prefix) => {
                    let reference = match value {
                        Value::String(path) => Some(path.clone()),
                        Value::Null => None,
                        _ => {
                            return Err(schema_error(format!(
                                "column '{column}' must be a string path or null"
                            )))
                        }
                    };
                    if first_named.is_none() {
                        if let Some(reference) = &reference {
                            first_named = Some((column.clone(), reference.clone()));
                        }
                    }
                    extra_files.insert(prefix, reference);
                }
            }
        }

        let (key_column, key_reference) = if let Some(reference) = primary {
            (FILE_NAME_COLUMN.to_string(), reference)
        } else if let Some((column, reference)) = first_named {
            (column, reference)
        } else {
            return Err(schema_error(format!(
                "row has no file reference column (expected '{FILE_NAME_COLUMN}' or a column ending in '{FILE_NAME_SUFFIX}'); found columns: {}",
                row.values.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        };

        Ok(Self {
            source: source.clone(),
            location: row.location,
            key_column,
            key_reference,
            plain,
            extra_files,
        })
    }

    /// The metadata file this record came from.
    pub fn source(&self) -> &FileRef {
        &self.source
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// The column whose path keys this record in the index.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// The path written in the key column, as it appears in the file.
    pub fn key_reference(&self) -> &str {
        &self.key_reference
    }

    /// Non-file-reference columns.
    pub fn plain_columns(&self) -> &BTreeMap<String, Value> {
        &self.plain
    }

    /// Extra file-reference columns keyed by output name (suffix stripped).
    pub fn extra_file_columns(&self) -> &BTreeMap<String, Option<String>> {
        &self.extra_files
    }

    /// Resolves a reference relative to this record's metadata file.
    pub fn resolve(&self, reference: &str) -> Result<FileRef, AudioFolderError> {
        self.source.sibling(reference)
    }
}

/// Key of a [`MetadataIndex`]: archive scope plus normalized relative path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey {
    scope: Option<PathBuf>,
    path: String,
}

impl IndexKey {
    pub fn of(file: &FileRef) -> Self {
        Self {
            scope: file.scope().map(Path::to_path_buf),
            path: file.relative_path().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Per-split mapping from relative file path to its metadata record.
#[derive(Clone, Debug, Default)]
pub struct MetadataIndex {
    records: BTreeMap<IndexKey, MetadataRecord>,
}

impl MetadataIndex {
    /// Looks up the record joined to `file`, matching scope and path exactly.
    pub fn get(&self, file: &FileRef) -> Option<&MetadataRecord> {
        self.records.get(&IndexKey::of(file))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.records.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.records.keys()
    }
}

/// Checks that all metadata files of a split share one format.
pub fn detect_format(
    split: &str,
    files: &[FileRef],
) -> Result<Option<MetadataFormat>, AudioFolderError> {
    let formats: BTreeSet<MetadataFormat> = files
        .iter()
        .filter_map(|file| MetadataFormat::from_file_name(file.file_name()))
        .collect();

    if formats.len() > 1 {
        return Err(AudioFolderError::MetadataFormatConflict {
            split: split.to_string(),
            extensions: formats
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    Ok(formats.into_iter().next())
}

/// Parses the raw bytes of one metadata file into rows.
pub fn parse_rows(
    format: MetadataFormat,
    path: &Path,
    bytes: Vec<u8>,
) -> Result<Vec<MetadataRow>, AudioFolderError> {
    match format {
        MetadataFormat::Jsonl => io_jsonl::parse_jsonl_rows(path, &bytes),
        MetadataFormat::Csv => io_csv::parse_csv_rows(path, &bytes),
        #[cfg(feature = "parquet")]
        MetadataFormat::Parquet => io_parquet::parse_parquet_rows(path, bytes),
        #[cfg(not(feature = "parquet"))]
        MetadataFormat::Parquet => Err(AudioFolderError::UnsupportedFormat(format!(
            "{} (metadata.parquet requires a build with feature 'parquet' enabled)",
            path.display()
        ))),
    }
}

/// Loads every metadata file of a split into one index.
///
/// Files are read in discovery order. Any malformed row, row without a file
/// reference, or duplicate key aborts the whole split.
pub fn load_metadata(
    split: &str,
    files: &[FileRef],
    mode: AccessMode,
) -> Result<MetadataIndex, AudioFolderError> {
    let Some(format) = detect_format(split, files)? else {
        return Ok(MetadataIndex::default());
    };

    let mut index = MetadataIndex::default();
    for file in files {
        let path = file.display_path();
        let bytes = file.read_bytes(mode)?;
        let rows = parse_rows(format, &path, bytes)?;
        debug!(split, file = %file, rows = rows.len(), "parsed metadata file");

        for row in rows {
            let record = MetadataRecord::from_row(file, row)?;
            let target = record.resolve(record.key_reference())?;
            let key = IndexKey::of(&target);

            if let Some(previous) = index.records.get(&key) {
                return Err(AudioFolderError::DuplicateMetadataKey {
                    split: split.to_string(),
                    key: key.path,
                    first: previous.source.display_path(),
                    second: path,
                });
            }
            index.records.insert(key, record);
        }
    }

    debug!(split, records = index.len(), %format, "built metadata index");
    Ok(index)
}

/// Fuzz-only entrypoint: parses a metadata file and validates every row.
#[cfg(feature = "fuzzing")]
pub fn fuzz_load_records(format: MetadataFormat, bytes: &[u8]) -> Result<(), AudioFolderError> {
    let name = format!("{METADATA_STEM}.{}", format.extension());
    let source = FileRef::plain(&name, Path::new("<fuzz>").join(&name));
    for row in parse_rows(format, Path::new("<fuzz>"), bytes.to_vec())? {
        let record = MetadataRecord::from_row(&source, row)?;
        record.resolve(record.key_reference())?;
    }
    Ok(())
}
