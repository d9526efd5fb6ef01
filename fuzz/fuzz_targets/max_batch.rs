#![no_main]

use libfuzzer_sys::fuzz_target;
use flatstore_core::config::{parse_max_batch, parse_max_time};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = parse_max_batch(raw);
        let _ = parse_max_time(raw);
    }
});
