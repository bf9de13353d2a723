//! Local directory discovery for the CLI.
//!
//! The library proper only accepts split-keyed file lists. This module is the
//! small convenience layer that builds one from a path on disk:
//!
//! - a `.zip` file becomes the `train` split,
//! - a directory with recognized split subdirectories (`train/`, `test/`,
//!   `validation/` and their common aliases) gets one split per subdirectory,
//! - any other directory becomes a single `train` split.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::AudioFolderError;
use crate::files::{FileRef, SplitFiles};

/// Directory-name aliases for each canonical split, in output order.
const SPLIT_ALIASES: [(&str, &[&str]); 3] = [
    ("train", &["train", "training"]),
    ("validation", &["validation", "valid", "val", "dev"]),
    ("test", &["test", "testing", "eval", "evaluation"]),
];

/// Maps a directory name to a canonical split name, case-insensitively.
pub fn canonical_split_name(dir_name: &str) -> Option<&'static str> {
    let lowered = dir_name.to_ascii_lowercase();
    SPLIT_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&lowered.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Builds split-keyed data files from a local directory or zip archive.
pub fn discover_local_splits(root: &Path) -> Result<SplitFiles, AudioFolderError> {
    if root.is_file() {
        let file = FileRef::plain(file_name_of(root)?, root);
        if !file.is_archive() {
            return Err(AudioFolderError::LayoutInvalid {
                path: root.to_path_buf(),
                message: "expected a directory or a .zip archive".to_string(),
            });
        }
        return Ok(SplitFiles::new().with_split("train", vec![file]));
    }

    if !root.is_dir() {
        return Err(AudioFolderError::LayoutInvalid {
            path: root.to_path_buf(),
            message: "path does not exist".to_string(),
        });
    }

    let split_dirs = find_split_dirs(root)?;
    if split_dirs.is_empty() {
        debug!(root = %root.display(), "no split subdirectories, using a single train split");
        return Ok(SplitFiles::new().with_split("train", collect_files(root)?));
    }

    let mut splits = SplitFiles::new();
    for (canonical, _) in SPLIT_ALIASES {
        if let Some((_, dir)) = split_dirs.iter().find(|(name, _)| *name == canonical) {
            debug!(split = canonical, dir = %dir.display(), "discovered split directory");
            splits.insert(canonical, collect_files(dir)?);
        }
    }
    Ok(splits)
}

fn find_split_dirs(root: &Path) -> Result<Vec<(&'static str, PathBuf)>, AudioFolderError> {
    let mut found: Vec<(&'static str, PathBuf)> = Vec::new();

    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(canonical) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(canonical_split_name)
        else {
            continue;
        };

        if let Some((_, existing)) = found.iter().find(|(name, _)| *name == canonical) {
            return Err(AudioFolderError::LayoutInvalid {
                path: root.to_path_buf(),
                message: format!(
                    "both '{}' and '{}' map to split '{canonical}'",
                    existing.display(),
                    path.display()
                ),
            });
        }
        found.push((canonical, path));
    }

    Ok(found)
}

/// Collects every regular file under `dir`, relative to `dir`, sorted by path.
fn collect_files(dir: &Path) -> Result<Vec<FileRef>, AudioFolderError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| AudioFolderError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| AudioFolderError::LayoutInvalid {
                path: entry.path().to_path_buf(),
                message: format!("not under {}", dir.display()),
            })?;
        let relative = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(FileRef::plain(relative, entry.path()));
    }

    Ok(files)
}

fn file_name_of(path: &Path) -> Result<String, AudioFolderError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| AudioFolderError::LayoutInvalid {
            path: path.to_path_buf(),
            message: "path has no file name".to_string(),
        })
}
