//! Builder configuration and its up-front validation.
//!
//! Validation happens when a [`FolderConfig`] is constructed, before any file
//! is opened. Split membership must already be resolved by the caller.

use serde::Serialize;

use crate::error::AudioFolderError;
use crate::files::{FileRef, SplitFiles};

/// Audio file extensions recognized as media (lowercase, no dot).
pub const AUDIO_EXTENSIONS: [&str; 30] = [
    "aiff", "au", "avr", "caf", "flac", "htk", "svx", "mat4", "mat5", "mpc2k", "ogg", "paf",
    "pvf", "raw", "rf64", "sd2", "sds", "ircam", "voc", "w64", "wav", "nist", "wavex", "wve",
    "xi", "mp3", "opus", "m4a", "aac", "wma",
];

/// Image file extensions recognized as media (lowercase, no dot).
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff", "ico", "pgm",
];

/// The kind of media a folder holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Audio,
    Image,
}

impl MediaKind {
    /// Name of the primary media column in generated examples.
    pub fn column_name(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &AUDIO_EXTENSIONS,
            MediaKind::Image => &IMAGE_EXTENSIONS,
        }
    }

    /// Returns true if `ext` (case-insensitive, no dot) is a media extension.
    pub fn matches_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.extensions().contains(&ext.as_str())
    }

    pub fn as_str(self) -> &'static str {
        self.column_name()
    }
}

/// Data files as handed in by a caller.
///
/// Only [`DataFiles::Splits`] is accepted; the other shapes exist so callers
/// get a clear error instead of a silent guess about split membership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataFiles {
    /// A bare path or pattern.
    Path(String),
    /// A flat list of files with no split assignment.
    List(Vec<FileRef>),
    /// Files already partitioned by split.
    Splits(SplitFiles),
}

impl DataFiles {
    fn describe(&self) -> String {
        match self {
            DataFiles::Path(path) => format!("a bare path '{path}'"),
            DataFiles::List(files) => format!("a flat list of {} file(s)", files.len()),
            DataFiles::Splits(_) => "a split mapping".to_string(),
        }
    }
}

impl From<SplitFiles> for DataFiles {
    fn from(value: SplitFiles) -> Self {
        DataFiles::Splits(value)
    }
}

impl From<&str> for DataFiles {
    fn from(value: &str) -> Self {
        DataFiles::Path(value.to_string())
    }
}

impl From<String> for DataFiles {
    fn from(value: String) -> Self {
        DataFiles::Path(value)
    }
}

impl From<Vec<FileRef>> for DataFiles {
    fn from(value: Vec<FileRef>) -> Self {
        DataFiles::List(value)
    }
}

/// Validated configuration for a folder-based builder.
#[derive(Clone, Debug)]
pub struct FolderConfig {
    name: String,
    data_files: SplitFiles,
    drop_metadata: Option<bool>,
    drop_labels: Option<bool>,
    media_kind: MediaKind,
}

impl FolderConfig {
    /// Validates `name` and `data_files` and builds a configuration with
    /// automatic defaults for both drop flags.
    pub fn new(
        name: impl Into<String>,
        data_files: impl Into<DataFiles>,
    ) -> Result<Self, AudioFolderError> {
        let name = name.into();
        validate_config_name(&name)?;
        let data_files = validate_data_files(data_files.into())?;

        Ok(Self {
            name,
            data_files,
            drop_metadata: None,
            drop_labels: None,
            media_kind: MediaKind::default(),
        })
    }

    /// `None` picks the automatic default, `Some(true)` forces metadata off.
    pub fn with_drop_metadata(mut self, drop_metadata: Option<bool>) -> Self {
        self.drop_metadata = drop_metadata;
        self
    }

    /// `None` picks the automatic default, `Some(true)` forces labels off.
    pub fn with_drop_labels(mut self, drop_labels: Option<bool>) -> Self {
        self.drop_labels = drop_labels;
        self
    }

    pub fn with_media_kind(mut self, media_kind: MediaKind) -> Self {
        self.media_kind = media_kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_files(&self) -> &SplitFiles {
        &self.data_files
    }

    pub fn drop_metadata(&self) -> Option<bool> {
        self.drop_metadata
    }

    pub fn drop_labels(&self) -> Option<bool> {
        self.drop_labels
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }
}

/// Checks that a config name is non-empty and only uses `[A-Za-z0-9._-]`.
pub fn validate_config_name(name: &str) -> Result<(), AudioFolderError> {
    if name.is_empty() {
        return Err(AudioFolderError::EmptyConfigName);
    }

    if let Some(offending) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(AudioFolderError::InvalidConfigName {
            name: name.to_string(),
            offending,
        });
    }

    Ok(())
}

/// Accepts only data files that are already keyed by split name.
pub fn validate_data_files(data_files: DataFiles) -> Result<SplitFiles, AudioFolderError> {
    match data_files {
        DataFiles::Splits(splits) => {
            if let Some(split) = splits.iter().find(|split| split.name().trim().is_empty()) {
                return Err(AudioFolderError::InvalidDataFiles {
                    found: format!(
                        "a split mapping with an empty split name ({} file(s))",
                        split.files().len()
                    ),
                });
            }
            Ok(splits)
        }
        other => Err(AudioFolderError::InvalidDataFiles {
            found: other.describe(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_split() -> SplitFiles {
        SplitFiles::new().with_split("train", vec![FileRef::plain("a.wav", "/d/a.wav")])
    }

    #[test]
    fn accepts_allowed_characters() {
        for name in ["default", "my-config_v1.2", "A9"] {
            FolderConfig::new(name, one_split()).expect("valid name");
        }
    }

    #[test]
    fn rejects_star_and_names_the_character_class() {
        let err = FolderConfig::new("name-with-*-invalid-character", one_split())
            .expect_err("should fail");
        assert!(err.is_configuration_error());
        let message = err.to_string();
        assert!(message.contains("Bad characters"));
        assert!(message.contains("'*'"));
        assert!(message.contains("[A-Za-z0-9._-]"));
    }

    #[test]
    fn rejects_path_separators_and_spaces() {
        for name in ["a/b", "a\\b", "a b", "a:b"] {
            let err = validate_config_name(name).expect_err("should fail");
            assert!(matches!(err, AudioFolderError::InvalidConfigName { .. }));
        }
    }

    #[test]
    fn rejects_empty_name_without_blaming_a_character() {
        let err = FolderConfig::new("", one_split()).expect_err("should fail");
        assert!(err.is_configuration_error());
        match &err {
            AudioFolderError::EmptyConfigName => {}
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("must not be empty"));
        assert!(!message.contains("' '"));
    }

    #[test]
    fn rejects_data_files_without_split_keys() {
        let shapes: Vec<DataFiles> = vec![
            "str_path".into(),
            vec![FileRef::plain("str_path", "str_path")].into(),
        ];
        for shape in shapes {
            let err = FolderConfig::new("name", shape).expect_err("should fail");
            assert!(err.is_configuration_error());
            assert!(err.to_string().contains("Expected a split-keyed mapping"));
        }
    }

    #[test]
    fn drop_flags_default_to_automatic() {
        let config = FolderConfig::new("name", one_split()).expect("valid");
        assert_eq!(config.drop_labels(), None);
        assert_eq!(config.drop_metadata(), None);
        assert_eq!(config.media_kind(), MediaKind::Audio);
    }

    #[test]
    fn media_extension_match_is_case_insensitive() {
        assert!(MediaKind::Audio.matches_extension("WAV"));
        assert!(MediaKind::Image.matches_extension("png"));
        assert!(!MediaKind::Audio.matches_extension("png"));
    }
}
