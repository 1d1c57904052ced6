#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject input but must never panic, and a
    // config that validates must also build a control loop.
    let Ok(cfg) = throttle_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let built = throttle_core::Throttle::builder().apply_config(&cfg).build();
        assert!(built.is_ok(), "validated config rejected: {built:?}");
    }
});
