#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<pendant_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // Anything that validates must also convert and build.
        let core = pendant_core::PendantConfig::from(&cfg);
        let built = pendant_core::Pendant::builder()
            .with_panel(pendant_core::mocks::FixedPanel(Default::default()))
            .with_bus(pendant_hardware::RecordingBus::new())
            .with_config(core)
            .build();
        assert!(built.is_ok(), "validated config rejected by builder: {built:?}");
    }
});
