use std::path::PathBuf;
use thiserror::Error;

/// The main error type for audiofolder operations.
#[derive(Debug, Error)]
pub enum AudioFolderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Bad characters found in config name '{name}': {offending:?} is outside the allowed \
         character class [A-Za-z0-9._-]"
    )]
    InvalidConfigName { name: String, offending: char },

    #[error("Config name must not be empty")]
    EmptyConfigName,

    #[error("Expected a split-keyed mapping of data files (split name -> file list), found {found}")]
    InvalidDataFiles { found: String },

    #[error(
        "Split '{split}' contains metadata files with different extensions: {extensions}. \
         Use a single metadata format per split"
    )]
    MetadataFormatConflict { split: String, extensions: String },

    #[error("Invalid metadata schema in {path}: {message}")]
    MetadataSchema { path: PathBuf, message: String },

    #[error("Failed to parse metadata {path} at {location}: {message}")]
    MetadataParse {
        path: PathBuf,
        location: String,
        message: String,
    },

    #[error("Duplicate metadata entry for '{key}' in split '{split}' (seen in {first} and {second})")]
    DuplicateMetadataKey {
        split: String,
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Column '{column}' from {path} collides with a generated column")]
    ColumnConflict { column: String, path: PathBuf },

    #[error("File reference '{reference}' in {path} escapes its root directory")]
    PathEscapesRoot { reference: String, path: PathBuf },

    #[error("Failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Archive {archive} has no member '{member}'")]
    MemberNotFound { archive: PathBuf, member: String },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl AudioFolderError {
    /// Returns true for errors raised while validating the builder
    /// configuration, before any file is touched.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AudioFolderError::InvalidConfigName { .. }
                | AudioFolderError::EmptyConfigName
                | AudioFolderError::InvalidDataFiles { .. }
        )
    }
}
