#![no_main]

use libfuzzer_sys::fuzz_target;
use peekbias::metric::parse_observations;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must never panic, and accepted values are always finite
        if let Ok(values) = parse_observations(input) {
            assert!(values.iter().all(|v| v.is_finite()));
        }
    }
});
