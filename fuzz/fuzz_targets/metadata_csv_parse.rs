//! Fuzz target for metadata.csv row parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the CSV metadata parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use audiofolder::metadata::io_csv::from_csv_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_csv_slice(data);
});
