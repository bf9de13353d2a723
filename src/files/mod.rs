//! Addressable files and per-split file collections.
//!
//! A [`FileRef`] is either a plain path on disk or a member of a zip archive.
//! Both expose the same two things: a split-root-relative logical path and an
//! open-for-read capability. Nothing here decodes media content.
//!
//! # Relative paths
//!
//! Logical paths are posix-style (`/`-separated), never start with `/`, and
//! contain no `.` components. `..` components are folded away; a path that
//! climbs above its root cannot be folded and keeps them verbatim, which
//! [`FileRef::escapes_root`] reports and classification rejects. For archive
//! members paths are relative to the archive's internal root.

mod archive;
pub mod classify;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::AudioFolderError;

/// Extensions treated as expandable archives.
const ARCHIVE_EXTENSIONS: [&str; 1] = ["zip"];

/// How archive contents are accessed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Random access into archives (central directory lookups).
    #[default]
    Materialized,
    /// Sequential, single-pass reads; one entry open at a time.
    Streamed,
}

/// Physical location of a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locator {
    /// A file directly on the filesystem.
    Path(PathBuf),
    /// An entry inside a zip archive.
    ArchiveMember { archive: PathBuf, member: String },
}

/// An addressable file, plain or archive-resident. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRef {
    relative_path: String,
    locator: Locator,
}

impl FileRef {
    /// Creates a reference to a plain file.
    ///
    /// `relative_path` is the split-root-relative logical path; backslashes
    /// are converted to forward slashes and `.`/`..` components are folded.
    /// A path climbing above the root keeps its `..` components; see
    /// [`FileRef::escapes_root`].
    pub fn plain(relative_path: impl AsRef<str>, path: impl Into<PathBuf>) -> Self {
        let raw = relative_path.as_ref();
        let relative_path = normalize_relative(raw).unwrap_or_else(|| raw.replace('\\', "/"));
        Self {
            relative_path,
            locator: Locator::Path(path.into()),
        }
    }

    /// Creates a reference to an entry inside a zip archive.
    ///
    /// The member name is normalized like [`FileRef::plain`].
    pub fn archive_member(archive: impl Into<PathBuf>, member: impl Into<String>) -> Self {
        let member = member.into();
        let relative_path = normalize_relative(&member).unwrap_or_else(|| member.replace('\\', "/"));
        Self {
            relative_path,
            locator: Locator::ArchiveMember {
                archive: archive.into(),
                member,
            },
        }
    }

    /// The logical path relative to the split root (or archive root).
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Whether the logical path climbs above its root (`../x.wav`).
    pub fn escapes_root(&self) -> bool {
        self.relative_path.split('/').any(|component| component == "..")
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The base name of the logical path.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// The lowercased extension of the base name, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// The logical directory containing this file, `""` at the root.
    pub fn parent_dir(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    /// The archive this file lives in, or `None` for plain files.
    ///
    /// Relative paths are only comparable within the same scope.
    pub fn scope(&self) -> Option<&Path> {
        match &self.locator {
            Locator::Path(_) => None,
            Locator::ArchiveMember { archive, .. } => Some(archive),
        }
    }

    /// Returns true for plain files whose extension marks an expandable archive.
    pub fn is_archive(&self) -> bool {
        matches!(self.locator, Locator::Path(_))
            && self
                .extension()
                .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// A path suitable for error messages and logs.
    pub fn display_path(&self) -> PathBuf {
        match &self.locator {
            Locator::Path(path) => path.clone(),
            Locator::ArchiveMember { archive, member } => archive.join(member),
        }
    }

    /// Resolves `reference` relative to this file's directory.
    ///
    /// The result stays in the same scope: a sibling of an archive member is
    /// another member of the same archive.
    pub fn sibling(&self, reference: &str) -> Result<FileRef, AudioFolderError> {
        let escapes = || AudioFolderError::PathEscapesRoot {
            reference: reference.to_string(),
            path: self.display_path(),
        };
        let joined = join_relative(self.parent_dir(), reference);
        let relative_path = normalize_relative(&joined).ok_or_else(escapes)?;

        let locator = match &self.locator {
            Locator::Path(path) => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Locator::Path(base.join(reference.replace('\\', "/")))
            }
            Locator::ArchiveMember { archive, member } => {
                let member_dir = member.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
                let member = normalize_relative(&join_relative(member_dir, reference))
                    .ok_or_else(escapes)?;
                Locator::ArchiveMember {
                    archive: archive.clone(),
                    member,
                }
            }
        };

        Ok(FileRef {
            relative_path,
            locator,
        })
    }

    /// Opens the file for reading.
    ///
    /// Plain files are streamed from disk. Archive members are extracted
    /// into memory with the archive handle released before this returns.
    pub fn open(&self, mode: AccessMode) -> Result<Box<dyn Read + Send>, AudioFolderError> {
        match &self.locator {
            Locator::Path(path) => {
                let file = File::open(path).map_err(AudioFolderError::Io)?;
                Ok(Box::new(BufReader::new(file)))
            }
            Locator::ArchiveMember { archive, member } => {
                let bytes = archive::read_member(archive, member, mode)?;
                Ok(Box::new(Cursor::new(bytes)))
            }
        }
    }

    /// Reads the whole file into memory.
    pub fn read_bytes(&self, mode: AccessMode) -> Result<Vec<u8>, AudioFolderError> {
        match &self.locator {
            Locator::Path(path) => std::fs::read(path).map_err(AudioFolderError::Io),
            Locator::ArchiveMember { archive, member } => {
                archive::read_member(archive, member, mode)
            }
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Locator::Path(_) => write!(f, "{}", self.relative_path),
            Locator::ArchiveMember { archive, .. } => {
                write!(f, "{}::{}", archive.display(), self.relative_path)
            }
        }
    }
}

/// A named partition of the dataset with its own ordered file list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    name: String,
    files: Vec<FileRef>,
}

impl Split {
    pub fn new(name: impl Into<String>, files: Vec<FileRef>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files in discovery order.
    pub fn files(&self) -> &[FileRef] {
        &self.files
    }
}

/// Ordered mapping from split name to that split's files.
///
/// Insertion order is preserved so generation order is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitFiles {
    splits: Vec<Split>,
}

impl SplitFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a split, replacing the file list of an existing split with the
    /// same name in place.
    pub fn insert(&mut self, name: impl Into<String>, files: Vec<FileRef>) {
        let name = name.into();
        if let Some(existing) = self.splits.iter_mut().find(|split| split.name == name) {
            existing.files = files;
        } else {
            self.splits.push(Split::new(name, files));
        }
    }

    /// Builder-style variant of [`SplitFiles::insert`].
    pub fn with_split(mut self, name: impl Into<String>, files: Vec<FileRef>) -> Self {
        self.insert(name, files);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Split> {
        self.splits.iter().find(|split| split.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Split> {
        self.splits.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.splits.iter().map(|split| split.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

/// Normalizes a relative path to forward slashes, folding `.` and `..`.
///
/// Returns `None` if the path climbs above its root.
pub fn normalize_relative(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

fn join_relative(dir: &str, reference: &str) -> String {
    if dir.is_empty() {
        reference.to_string()
    } else {
        format!("{dir}/{reference}")
    }
}
