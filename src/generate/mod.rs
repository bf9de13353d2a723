//! Lazy example generation for one split.
//!
//! A [`GenerationPlan`] holds everything resolved up front for a split: the
//! media files in order, the metadata index, the inferred labels and the
//! activation decision. [`GenerationPlan::examples`] then walks the media
//! files one at a time; nothing is produced until the consumer asks for it,
//! and a fresh call starts over with identical output.

pub mod schema;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::config::MediaKind;
use crate::error::AudioFolderError;
use crate::files::{AccessMode, FileRef};
use crate::labels::InferredLabels;
use crate::metadata::MetadataIndex;

pub use schema::{Dtype, Feature, Features};

/// Name of the inferred label column.
pub const LABEL_COLUMN: &str = "label";

/// Decides whether an optional column group is produced.
///
/// | available | flag          | active |
/// |-----------|---------------|--------|
/// | no        | any           | no     |
/// | yes       | `Some(true)`  | no     |
/// | yes       | `None`        | yes    |
/// | yes       | `Some(false)` | yes    |
pub fn resolve_activation(drop_flag: Option<bool>, available: bool) -> bool {
    match (available, drop_flag) {
        (false, _) => false,
        (true, Some(true)) => false,
        (true, None | Some(false)) => true,
    }
}

/// User-facing drop flags; `None` means "use the automatic default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropFlags {
    pub drop_metadata: Option<bool>,
    pub drop_labels: Option<bool>,
}

/// Which optional column groups a split produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activation {
    pub add_metadata: bool,
    pub add_labels: bool,
}

impl Activation {
    pub fn decide(flags: DropFlags, has_metadata: bool, labels_inferable: bool) -> Self {
        Self {
            add_metadata: resolve_activation(flags.drop_metadata, has_metadata),
            add_labels: resolve_activation(flags.drop_labels, labels_inferable),
        }
    }
}

/// A lazily opened reference to a file-backed column value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRef {
    file: FileRef,
    mode: AccessMode,
}

impl MediaRef {
    pub fn new(file: FileRef, mode: AccessMode) -> Self {
        Self { file, mode }
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    /// The split-root-relative (or archive-relative) path.
    pub fn path(&self) -> &str {
        self.file.relative_path()
    }

    pub fn open(&self) -> Result<Box<dyn Read + Send>, AudioFolderError> {
        self.file.open(self.mode)
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, AudioFolderError> {
        self.file.read_bytes(self.mode)
    }
}

/// One column value of an [`Example`].
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    /// The primary media file or a resolved extra file reference.
    Media(MediaRef),
    /// Code into the split's label vocabulary.
    Label(usize),
    /// A metadata value, as parsed.
    Scalar(Value),
    /// A null file reference.
    Null,
}

impl ColumnValue {
    pub fn as_media(&self) -> Option<&MediaRef> {
        match self {
            ColumnValue::Media(media) => Some(media),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null | ColumnValue::Scalar(Value::Null))
    }

    /// JSON rendering used by the CLI.
    pub fn to_json(&self) -> Value {
        match self {
            ColumnValue::Media(media) => json!({
                "path": media.path(),
                "source": media.file().display_path().to_string_lossy(),
            }),
            ColumnValue::Label(code) => Value::from(*code),
            ColumnValue::Scalar(value) => value.clone(),
            ColumnValue::Null => Value::Null,
        }
    }
}

/// The output unit: column name to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Example {
    columns: BTreeMap<String, ColumnValue>,
}

impl Example {
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn media(&self, column: &str) -> Option<&MediaRef> {
        self.get(column).and_then(ColumnValue::as_media)
    }

    pub fn label(&self) -> Option<usize> {
        match self.get(LABEL_COLUMN)? {
            ColumnValue::Label(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns a metadata scalar column.
    pub fn scalar(&self, column: &str) -> Option<&Value> {
        match self.get(column)? {
            ColumnValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.columns
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    fn insert(&mut self, column: impl Into<String>, value: ColumnValue) {
        self.columns.insert(column.into(), value);
    }
}

/// Split inputs resolved before generation.
#[derive(Clone, Debug, Default)]
pub struct SplitData {
    pub media: Vec<FileRef>,
    pub metadata: MetadataIndex,
    pub labels: Option<InferredLabels>,
}

/// Metadata output columns of a split: the union over all records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataColumns {
    pub plain: BTreeSet<String>,
    pub extra_files: BTreeSet<String>,
}

impl MetadataColumns {
    fn collect(metadata: &MetadataIndex) -> Self {
        let mut columns = MetadataColumns::default();
        for record in metadata.records() {
            columns.plain.extend(record.plain_columns().keys().cloned());
            columns
                .extra_files
                .extend(record.extra_file_columns().keys().cloned());
        }
        columns
    }
}

/// Everything needed to generate one split, read-only once built.
///
/// With metadata active, every example carries every metadata column of the
/// split; columns a file's row lacks (or all of them, for a file without a
/// row) are null.
#[derive(Clone, Debug)]
pub struct GenerationPlan {
    split: String,
    media_kind: MediaKind,
    mode: AccessMode,
    data: SplitData,
    activation: Activation,
    metadata_columns: MetadataColumns,
}

impl GenerationPlan {
    /// Resolves activation and checks that metadata columns cannot shadow
    /// generated columns.
    pub fn new(
        split: impl Into<String>,
        media_kind: MediaKind,
        mode: AccessMode,
        data: SplitData,
        flags: DropFlags,
    ) -> Result<Self, AudioFolderError> {
        let split = split.into();
        let activation = Activation::decide(flags, !data.metadata.is_empty(), data.labels.is_some());
        debug!(
            split = %split,
            add_metadata = activation.add_metadata,
            add_labels = activation.add_labels,
            media = data.media.len(),
            "resolved generation plan"
        );

        let metadata_columns = if activation.add_metadata {
            MetadataColumns::collect(&data.metadata)
        } else {
            MetadataColumns::default()
        };
        let plan = Self {
            split,
            media_kind,
            mode,
            data,
            activation,
            metadata_columns,
        };
        plan.check_column_conflicts()?;
        plan.log_join_coverage();
        Ok(plan)
    }

    fn log_join_coverage(&self) {
        if !self.activation.add_metadata {
            return;
        }
        let matched = self
            .data
            .media
            .iter()
            .filter(|file| self.data.metadata.get(file).is_some())
            .count();
        let unmatched_media = self.data.media.len() - matched;
        let orphan_rows = self.data.metadata.len().saturating_sub(matched);
        if unmatched_media > 0 || orphan_rows > 0 {
            warn!(
                split = %self.split,
                unmatched_media,
                orphan_rows,
                "metadata does not cover every media file"
            );
        }
    }

    fn check_column_conflicts(&self) -> Result<(), AudioFolderError> {
        if !self.activation.add_metadata {
            return Ok(());
        }

        let media_column = self.media_kind.column_name();
        if let Some(column) = self
            .metadata_columns
            .extra_files
            .intersection(&self.metadata_columns.plain)
            .next()
        {
            let source = self
                .data
                .metadata
                .records()
                .find(|record| record.extra_file_columns().contains_key(column))
                .map(|record| record.source().display_path())
                .unwrap_or_default();
            return Err(AudioFolderError::ColumnConflict {
                column: column.clone(),
                path: source,
            });
        }
        for record in self.data.metadata.records() {
            let conflict = |column: &str| AudioFolderError::ColumnConflict {
                column: column.to_string(),
                path: record.source().display_path(),
            };
            let plain = record.plain_columns();
            for column in plain.keys() {
                if column == media_column || (self.activation.add_labels && column == LABEL_COLUMN)
                {
                    return Err(conflict(column));
                }
            }
            for column in record.extra_file_columns().keys() {
                if column == media_column || (self.activation.add_labels && column == LABEL_COLUMN)
                {
                    return Err(conflict(column));
                }
            }
        }
        Ok(())
    }

    pub fn split_name(&self) -> &str {
        &self.split
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn add_metadata(&self) -> bool {
        self.activation.add_metadata
    }

    pub fn add_labels(&self) -> bool {
        self.activation.add_labels
    }

    pub fn media_files(&self) -> &[FileRef] {
        &self.data.media
    }

    pub fn metadata(&self) -> &MetadataIndex {
        &self.data.metadata
    }

    pub fn labels(&self) -> Option<&InferredLabels> {
        self.data.labels.as_ref()
    }

    /// Metadata columns every example carries; empty when metadata is off.
    pub fn metadata_columns(&self) -> &MetadataColumns {
        &self.metadata_columns
    }

    /// The declared output schema, computable before any example is built.
    pub fn features(&self) -> Features {
        Features::for_plan(self)
    }

    /// A fresh lazy cursor over this split's examples.
    pub fn examples(&self) -> Examples<'_> {
        Examples {
            plan: self,
            position: 0,
        }
    }

    /// Generates every example eagerly. Stops at the first error.
    pub fn materialize(&self) -> Result<PreparedSplit, AudioFolderError> {
        let examples = self
            .examples()
            .map(|result| result.map(|(_, example)| example))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PreparedSplit {
            name: self.split.clone(),
            features: self.features(),
            examples,
        })
    }

    fn build_example(&self, position: usize, file: &FileRef) -> Result<Example, AudioFolderError> {
        let mut example = Example::default();
        example.insert(
            self.media_kind.column_name(),
            ColumnValue::Media(MediaRef::new(file.clone(), self.mode)),
        );

        if self.activation.add_metadata {
            for column in &self.metadata_columns.plain {
                example.insert(column.clone(), ColumnValue::Scalar(Value::Null));
            }
            for column in &self.metadata_columns.extra_files {
                example.insert(column.clone(), ColumnValue::Null);
            }
            match self.data.metadata.get(file) {
                Some(record) => {
                    for (column, value) in record.plain_columns() {
                        example.insert(column.clone(), ColumnValue::Scalar(value.clone()));
                    }
                    for (column, reference) in record.extra_file_columns() {
                        let value = match reference {
                            Some(reference) => {
                                ColumnValue::Media(MediaRef::new(record.resolve(reference)?, self.mode))
                            }
                            None => ColumnValue::Null,
                        };
                        example.insert(column.clone(), value);
                    }
                }
                None => debug!(split = %self.split, file = %file, "no metadata row for file"),
            }
        }

        if self.activation.add_labels {
            if let Some(code) = self.data.labels.as_ref().and_then(|l| l.code_at(position)) {
                example.insert(LABEL_COLUMN, ColumnValue::Label(code));
            }
        }

        trace!(split = %self.split, position, file = %file, "generated example");
        Ok(example)
    }
}

/// Pull-based cursor over a split's examples, keyed by position.
///
/// Finite and not restartable; call [`GenerationPlan::examples`] again to
/// start over. A failed example is yielded as an error and the cursor moves
/// on, so the caller decides whether to stop or skip.
#[derive(Debug)]
pub struct Examples<'a> {
    plan: &'a GenerationPlan,
    position: usize,
}

impl Iterator for Examples<'_> {
    type Item = Result<(usize, Example), AudioFolderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.plan.data.media.get(self.position)?;
        let key = self.position;
        self.position += 1;
        Some(self.plan.build_example(key, file).map(|example| (key, example)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.data.media.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Examples<'_> {}

/// A fully generated split.
#[derive(Clone, Debug)]
pub struct PreparedSplit {
    pub name: String,
    pub features: Features,
    pub examples: Vec<Example>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::infer_labels;
    use crate::metadata::load_metadata;

    #[test]
    fn activation_table_matches_flag_and_availability() {
        for flag in [None, Some(true), Some(false)] {
            assert!(!resolve_activation(flag, false));
        }
        assert!(resolve_activation(None, true));
        assert!(resolve_activation(Some(false), true));
        assert!(!resolve_activation(Some(true), true));
    }

    #[test]
    fn labels_without_metadata_generate_media_and_label() {
        let media = vec![
            FileRef::plain("fr/a.wav", "/d/fr/a.wav"),
            FileRef::plain("uk/b.wav", "/d/uk/b.wav"),
        ];
        let labels = infer_labels(&media);
        let plan = GenerationPlan::new(
            "train",
            MediaKind::Audio,
            AccessMode::Materialized,
            SplitData {
                media,
                metadata: MetadataIndex::default(),
                labels,
            },
            DropFlags::default(),
        )
        .expect("plan");

        assert!(plan.add_labels());
        assert!(!plan.add_metadata());
        let examples: Vec<_> = plan.examples().map(|r| r.expect("example")).collect();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].0, 0);
        assert_eq!(examples[0].1.column_names(), vec!["audio", "label"]);
        assert_eq!(examples[0].1.label(), Some(0));
        assert_eq!(examples[1].1.label(), Some(1));
        assert_eq!(
            examples[1].1.media("audio").map(MediaRef::path),
            Some("uk/b.wav")
        );
    }

    #[test]
    fn cursor_is_lazy_and_recreatable() {
        let media = vec![FileRef::plain("a.wav", "/d/a.wav"), FileRef::plain("b.wav", "/d/b.wav")];
        let plan = GenerationPlan::new(
            "train",
            MediaKind::Audio,
            AccessMode::Materialized,
            SplitData {
                media,
                ..Default::default()
            },
            DropFlags::default(),
        )
        .expect("plan");

        let mut cursor = plan.examples();
        assert_eq!(cursor.len(), 2);
        let first = cursor.next().expect("first").expect("ok");
        assert_eq!(cursor.len(), 1);

        let again = plan.examples().next().expect("first").expect("ok");
        assert_eq!(first, again);
    }

    #[test]
    fn metadata_label_column_conflicts_when_labels_active() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(temp.path().join("fr")).expect("mkdir");
        let metadata_path = temp.path().join("metadata.jsonl");
        std::fs::write(
            &metadata_path,
            "{\"file_name\": \"fr/a.wav\", \"label\": \"x\"}\n",
        )
        .expect("write");
        let metadata = load_metadata(
            "train",
            &[FileRef::plain("metadata.jsonl", &metadata_path)],
            AccessMode::Materialized,
        )
        .expect("load");
        let media = vec![FileRef::plain("fr/a.wav", temp.path().join("fr/a.wav"))];
        let labels = infer_labels(&media);

        let data = SplitData {
            media,
            metadata,
            labels,
        };
        let err = GenerationPlan::new(
            "train",
            MediaKind::Audio,
            AccessMode::Materialized,
            data.clone(),
            DropFlags::default(),
        )
        .expect_err("conflict");
        assert!(matches!(err, AudioFolderError::ColumnConflict { .. }));

        let plan = GenerationPlan::new(
            "train",
            MediaKind::Audio,
            AccessMode::Materialized,
            data,
            DropFlags {
                drop_labels: Some(true),
                ..Default::default()
            },
        )
        .expect("no conflict without labels");
        assert_eq!(plan.features().column_names(), vec!["audio", "label"]);
    }

    fn plan_with_metadata(jsonl: &str, media_names: &[&str]) -> Result<GenerationPlan, AudioFolderError> {
        let temp = tempfile::tempdir().expect("tempdir");
        let metadata_path = temp.path().join("metadata.jsonl");
        std::fs::write(&metadata_path, jsonl).expect("write");
        let metadata = load_metadata(
            "train",
            &[FileRef::plain("metadata.jsonl", &metadata_path)],
            AccessMode::Materialized,
        )
        .expect("load");
        let media = media_names
            .iter()
            .map(|name| FileRef::plain(name, temp.path().join(name)))
            .collect();
        GenerationPlan::new(
            "train",
            MediaKind::Audio,
            AccessMode::Materialized,
            SplitData {
                media,
                metadata,
                labels: None,
            },
            DropFlags::default(),
        )
    }

    #[test]
    fn every_example_carries_the_declared_columns() {
        let plan = plan_with_metadata(
            "{\"file_name\": \"a.wav\", \"text\": \"hi\"}\n\
             {\"file_name\": \"b.wav\", \"speaker\": 3, \"noise_file_name\": \"n.wav\"}\n",
            &["a.wav", "b.wav", "c.wav"],
        )
        .expect("plan");
        let features = plan.features();
        let declared = features.column_names();
        assert_eq!(declared, vec!["audio", "noise", "speaker", "text"]);

        let examples: Vec<Example> = plan.examples().map(|r| r.expect("example").1).collect();
        for example in &examples {
            assert_eq!(example.column_names(), declared);
        }

        assert_eq!(examples[0].scalar("text"), Some(&json!("hi")));
        assert_eq!(examples[0].scalar("speaker"), Some(&Value::Null));
        assert_eq!(examples[0].get("noise"), Some(&ColumnValue::Null));
        assert_eq!(examples[1].scalar("speaker"), Some(&json!(3)));
        assert_eq!(
            examples[1].media("noise").map(MediaRef::path),
            Some("n.wav")
        );
        assert!(examples[2]
            .iter()
            .filter(|(name, _)| *name != "audio")
            .all(|(_, value)| value.is_null()));
    }

    #[test]
    fn extra_file_column_clashing_with_another_rows_plain_column_is_a_conflict() {
        let err = plan_with_metadata(
            "{\"file_name\": \"a.wav\", \"speech\": \"x\"}\n\
             {\"file_name\": \"b.wav\", \"speech_file_name\": \"b.wav\"}\n",
            &["a.wav", "b.wav"],
        )
        .expect_err("conflict");
        match err {
            AudioFolderError::ColumnConflict { column, .. } => assert_eq!(column, "speech"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
