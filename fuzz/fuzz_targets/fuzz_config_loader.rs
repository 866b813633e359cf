#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz TOML parsing of Config: invalid input must be rejected
    // gracefully, never panic.
    if let Ok(cfg) = pitctl_config::load_toml(data) {
        // Accessors must not panic on any accepted config either.
        let _ = cfg.is_fahrenheit();
        let _ = cfg.probes.len();
    }
});
