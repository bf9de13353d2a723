//! Fuzz target for metadata row validation.
//!
//! Parses the input as JSONL, then runs every row through file-reference
//! column classification and path resolution.

#![no_main]

use audiofolder::metadata::{fuzz_load_records, MetadataFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_load_records(MetadataFormat::Jsonl, data);
});
