#![no_main]

use libfuzzer_sys::fuzz_target;
use swapgrid_core::EngineConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for parsed in [EngineConfig::from_toml_str(text), EngineConfig::from_json_str(text)] {
        let Ok(config) = parsed else {
            continue;
        };
        // A config that validates must describe a playable ladder.
        if config.validate().is_empty() {
            assert!(config.max_items() >= 2);
            assert!(config.min_dwell() <= config.study_duration());
        }
    }
});
