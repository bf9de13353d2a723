//! Zip archive member listing and extraction.
//!
//! Materialized mode uses the central directory for random access. Streamed
//! mode walks local headers front to back and never seeks, so it also works
//! for archives that are only available as a forward-only byte stream.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use super::AccessMode;
use crate::error::AudioFolderError;

/// Lists file entries (directories excluded) in archive order.
pub(crate) fn list_members(archive: &Path, mode: AccessMode) -> Result<Vec<String>, AudioFolderError> {
    match mode {
        AccessMode::Materialized => list_members_random_access(archive),
        AccessMode::Streamed => list_members_sequential(archive),
    }
}

/// Reads one archive member fully into memory.
pub(crate) fn read_member(
    archive: &Path,
    member: &str,
    mode: AccessMode,
) -> Result<Vec<u8>, AudioFolderError> {
    match mode {
        AccessMode::Materialized => read_member_random_access(archive, member),
        AccessMode::Streamed => read_member_sequential(archive, member),
    }
}

fn open_archive(archive: &Path) -> Result<ZipArchive<BufReader<File>>, AudioFolderError> {
    let file = File::open(archive).map_err(AudioFolderError::Io)?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| archive_error(archive, source))
}

fn list_members_random_access(archive: &Path) -> Result<Vec<String>, AudioFolderError> {
    let mut zip = open_archive(archive)?;
    let mut names = Vec::with_capacity(zip.len());
    for idx in 0..zip.len() {
        let entry = zip
            .by_index(idx)
            .map_err(|source| archive_error(archive, source))?;
        if entry.is_dir() {
            continue;
        }
        names.push(entry.name().to_string());
    }
    Ok(names)
}

fn list_members_sequential(archive: &Path) -> Result<Vec<String>, AudioFolderError> {
    let file = File::open(archive).map_err(AudioFolderError::Io)?;
    let mut reader = BufReader::new(file);
    let mut names = Vec::new();

    loop {
        match zip::read::read_zipfile_from_stream(&mut reader) {
            Ok(Some(mut entry)) => {
                if !entry.is_dir() {
                    names.push(entry.name().to_string());
                }
                // The next local header starts after this entry's data.
                io::copy(&mut entry, &mut io::sink()).map_err(AudioFolderError::Io)?;
            }
            Ok(None) => break,
            Err(source) => return Err(archive_error(archive, source)),
        }
    }

    Ok(names)
}

fn read_member_random_access(archive: &Path, member: &str) -> Result<Vec<u8>, AudioFolderError> {
    let mut zip = open_archive(archive)?;
    let mut entry = zip.by_name(member).map_err(|source| match source {
        ZipError::FileNotFound => AudioFolderError::MemberNotFound {
            archive: archive.to_path_buf(),
            member: member.to_string(),
        },
        other => archive_error(archive, other),
    })?;

    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry.read_to_end(&mut bytes).map_err(AudioFolderError::Io)?;
    Ok(bytes)
}

fn read_member_sequential(archive: &Path, member: &str) -> Result<Vec<u8>, AudioFolderError> {
    let file = File::open(archive).map_err(AudioFolderError::Io)?;
    let mut reader = BufReader::new(file);

    loop {
        match zip::read::read_zipfile_from_stream(&mut reader) {
            Ok(Some(mut entry)) => {
                if entry.name() == member && !entry.is_dir() {
                    let mut bytes = Vec::new();
                    entry.read_to_end(&mut bytes).map_err(AudioFolderError::Io)?;
                    return Ok(bytes);
                }
                io::copy(&mut entry, &mut io::sink()).map_err(AudioFolderError::Io)?;
            }
            Ok(None) => {
                return Err(AudioFolderError::MemberNotFound {
                    archive: archive.to_path_buf(),
                    member: member.to_string(),
                })
            }
            Err(source) => return Err(archive_error(archive, source)),
        }
    }
}

fn archive_error(archive: &Path, source: ZipError) -> AudioFolderError {
    AudioFolderError::Archive {
        path: archive.to_path_buf(),
        source,
    }
}
