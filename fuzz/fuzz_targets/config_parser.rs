#![no_main]

use libfuzzer_sys::fuzz_target;
use peekbias::config::FileConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Anything that parses has already passed validation
        if let Ok(config) = FileConfig::from_toml_str(input) {
            assert!(config.simulation.validate().is_ok());
            assert!(config.metric.validate().is_ok());
        }
    }
});
