//! Directory-derived categorical labels.
//!
//! A media file's label is the directory component immediately enclosing it,
//! relative to the split root (or the archive root for archive members).
//! Inference is all-or-nothing per split: if any media file sits directly at
//! its root there is no grouping level, and the split gets no labels.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::files::FileRef;

/// Sorted, deduplicated label names. A label's code is its sort position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabelVocabulary {
    names: Vec<String>,
}

impl LabelVocabulary {
    /// Builds a vocabulary from label names in any order, with duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The code for `name`, if it is in the vocabulary.
    pub fn code(&self, name: &str) -> Option<usize> {
        self.names
            .binary_search_by(|candidate| candidate.as_str().cmp(name))
            .ok()
    }

    pub fn name(&self, code: usize) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }
}

/// Labels inferred for one split's media files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferredLabels {
    vocabulary: LabelVocabulary,
    /// Per media file, in split order.
    codes: Vec<usize>,
}

impl InferredLabels {
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// The code of the media file at `position` in split order.
    pub fn code_at(&self, position: usize) -> Option<usize> {
        self.codes.get(position).copied()
    }

    pub fn codes(&self) -> &[usize] {
        &self.codes
    }
}

/// The directory component immediately enclosing `file`, if any.
pub fn label_for(file: &FileRef) -> Option<&str> {
    let parent = file.parent_dir();
    if parent.is_empty() {
        return None;
    }
    parent.rsplit('/').next()
}

/// Infers labels for a split's media files.
///
/// Returns `None` when labels are not inferable: no media files, or at
/// least one file without an enclosing directory.
pub fn infer_labels(media: &[FileRef]) -> Option<InferredLabels> {
    if media.is_empty() {
        return None;
    }

    let per_file: Vec<&str> = media.iter().map(label_for).collect::<Option<_>>()?;
    let vocabulary = LabelVocabulary::from_names(per_file.iter().copied());
    let codes = per_file
        .iter()
        .map(|name| vocabulary.code(name))
        .collect::<Option<Vec<_>>>()?;

    Some(InferredLabels { vocabulary, codes })
}
