#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = covertrack_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Every validated cover must convert to runtime travel times.
            for c in cfg.covers.values() {
                let travel = covertrack_core::TravelCfg::from(c);
                assert!(!travel.up.is_zero() && !travel.down.is_zero());
            }
        }
    }
});
