//! Split file classification: media, metadata, or ignored.
//!
//! This is the only place where a zip archive is expanded into one
//! [`FileRef`] per member. Members keep the archive's entry order and get
//! relative paths rooted at the archive's internal root. A file or member
//! whose relative path climbs above its root is rejected.

use tracing::debug;

use super::{archive, AccessMode, FileRef, Split};
use crate::config::MediaKind;
use crate::error::AudioFolderError;
use crate::metadata::MetadataFormat;

/// A split's files partitioned by role. The three lists are disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifiedFiles {
    pub media: Vec<FileRef>,
    pub metadata: Vec<FileRef>,
    pub ignored: Vec<FileRef>,
}

/// Role of a single file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRole {
    Media,
    Metadata(MetadataFormat),
    Ignored,
}

/// Classifies one file by name alone.
///
/// Metadata is matched on the whole base name (`metadata.jsonl`, ...), so a
/// misnamed sidecar such as `bad_metadata.jsonl` is ignored, not an error.
pub fn classify_file(file: &FileRef, media_kind: MediaKind) -> FileRole {
    if let Some(format) = MetadataFormat::from_file_name(file.file_name()) {
        return FileRole::Metadata(format);
    }

    match file.extension() {
        Some(ext) if media_kind.matches_extension(&ext) => FileRole::Media,
        _ => FileRole::Ignored,
    }
}

/// Classifies a split, expanding archives in place.
pub fn classify_split(
    split: &Split,
    media_kind: MediaKind,
    mode: AccessMode,
) -> Result<ClassifiedFiles, AudioFolderError> {
    let mut classified = ClassifiedFiles::default();

    for file in split.files() {
        if file.is_archive() {
            let archive_path = file.display_path();
            let members = archive::list_members(&archive_path, mode)?;
            debug!(
                split = split.name(),
                archive = %archive_path.display(),
                members = members.len(),
                "expanded archive"
            );
            for member in members {
                let member = FileRef::archive_member(archive_path.clone(), member);
                // Nested archives are not expanded further.
                push_classified(&mut classified, member, media_kind)?;
            }
        } else {
            push_classified(&mut classified, file.clone(), media_kind)?;
        }
    }

    debug!(
        split = split.name(),
        media = classified.media.len(),
        metadata = classified.metadata.len(),
        ignored = classified.ignored.len(),
        "classified split files"
    );

    Ok(classified)
}

fn push_classified(
    classified: &mut ClassifiedFiles,
    file: FileRef,
    media_kind: MediaKind,
) -> Result<(), AudioFolderError> {
    if file.escapes_root() {
        return Err(AudioFolderError::PathEscapesRoot {
            reference: file.relative_path().to_string(),
            path: file.display_path(),
        });
    }

    match classify_file(&file, media_kind) {
        FileRole::Media => classified.media.push(file),
        FileRole::Metadata(_) => classified.metadata.push(file),
        FileRole::Ignored => {
            debug!(file = %file, "ignoring file");
            classified.ignored.push(file);
        }
    }
    Ok(())
}
