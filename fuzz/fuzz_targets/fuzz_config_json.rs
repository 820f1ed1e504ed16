//! Fuzz target for engine configuration parsing.
//!
//! Arbitrary JSON must either deserialize into a config or fail
//! cleanly; whatever deserializes must survive validation without
//! panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tactus_core::TrackerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<TrackerConfig>(data) {
        let _ = config.validate();
    }
});
