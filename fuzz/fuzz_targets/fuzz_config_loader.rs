#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = foamguard_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A config that validates must convert into runtime types cleanly.
            let _: foamguard_core::SamplerCfg = (&cfg.sampler).into();
            let _: foamguard_core::ControlCfg = (&cfg.control).into();
            let _: foamguard_core::OutboundCfg = (&cfg.channels).into();
        }
    }
});
