//! Fuzz target for metadata.jsonl row parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the JSONL metadata parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use audiofolder::metadata::io_jsonl::from_jsonl_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_jsonl_slice(data);
});
