#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use audiofolder::{FileRef, SplitFiles};
use zip::write::SimpleFileOptions;

/// A minimal mono 16-bit PCM WAV file. `seed` changes the sample data so
/// every fixture file has distinct bytes.
pub fn wav_bytes(seed: u8) -> Vec<u8> {
    let samples: Vec<u8> = (0..16u8).map(|i| i.wrapping_mul(seed).wrapping_add(seed)).collect();
    let data_len = samples.len() as u32;

    let mut bytes = Vec::with_capacity(44 + samples.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&16_000u32.to_le_bytes());
    bytes.extend_from_slice(&32_000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.extend_from_slice(&samples);
    bytes
}

pub fn write_bytes(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bytes).expect("write file");
}

pub fn write_wav(path: &Path, seed: u8) {
    write_bytes(path, &wav_bytes(seed));
}

pub fn write_text(path: &Path, text: &str) {
    write_bytes(path, text.as_bytes());
}

/// Writes a stored (uncompressed) zip with the given entries, in order.
pub fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let file = fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(bytes).expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}

/// Plain file references for `relative` paths under `root`, in the given order.
pub fn plain_files(root: &Path, relative: &[&str]) -> Vec<FileRef> {
    relative
        .iter()
        .map(|rel| FileRef::plain(rel, root.join(rel)))
        .collect()
}

/// A single `train` split over `relative` paths under `root`.
pub fn train_split(root: &Path, relative: &[&str]) -> SplitFiles {
    SplitFiles::new().with_split("train", plain_files(root, relative))
}
