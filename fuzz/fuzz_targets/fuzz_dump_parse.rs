//! Fuzz target for tracker dump parsing.
//!
//! Dumps may come from external files; parsing must only ever return
//! an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tactus_core::TrackerDump;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = text.parse::<TrackerDump>();
    }
});
