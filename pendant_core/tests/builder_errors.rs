use std::time::Duration;

use pendant_core::error::BuildError;
use pendant_core::mocks::FixedPanel;
use pendant_core::{Axis, Pendant, PendantConfig, SpeedMode};
use pendant_hardware::{RecordingBus, SimulatedPanel};
use pendant_traits::PanelLevels;
use rstest::rstest;

#[rstest]
fn builder_missing_panel_yields_typed_build_error() {
    let err = Pendant::builder()
        // missing with_panel()
        .with_bus(RecordingBus::new())
        .try_build()
        .expect_err("should fail with MissingPanel");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingPanel) => {}
        other => panic!("expected MissingPanel, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_bus_yields_typed_build_error() {
    let err = Pendant::builder()
        .with_panel(SimulatedPanel::default())
        .try_build()
        .expect_err("should fail with MissingBus");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingBus)
    ));
}

fn with(f: impl FnOnce(&mut PendantConfig)) -> PendantConfig {
    let mut cfg = PendantConfig::default();
    f(&mut cfg);
    cfg
}

#[rstest]
#[case::resolution_too_small(with(|c| c.pot.resolution = 1), "resolution")]
#[case::resolution_too_large(with(|c| c.pot.resolution = 258), "resolution")]
#[case::zero_full_scale(with(|c| c.pot.adc_full_scale = 0), "adc_full_scale")]
#[case::center_past_full_scale(with(|c| c.axes[Axis::Y].center = 20_000), "center")]
#[case::zero_click_width(with(|c| c.axes[Axis::X].click_pulse = Duration::ZERO), "pulse widths")]
#[case::zero_jog_width(with(|c| c.axes[Axis::Z].jog_pulse = Duration::ZERO), "pulse widths")]
#[case::speed_past_half_range(with(|c| c.speeds.x100 = 128), "half")]
#[case::adaptive_past_half_range(with(|c| c.adaptive.max_speed = 200), "half")]
#[case::inverted_speed_range(with(|c| c.adaptive.min_speed = 25), "min_speed")]
#[case::inverted_click_range(with(|c| c.adaptive.max_click_hz = 10.0), "click rate")]
#[case::zero_min_click(with(|c| c.adaptive.min_click_hz = 0.0), "click rate")]
#[case::nan_threshold(with(|c| c.pulse.jog_threshold_hz = f32::NAN), "jog_threshold_hz")]
#[case::zero_queue(with(|c| c.tick_queue_capacity = 0), "queue")]
fn invalid_config_is_rejected(#[case] cfg: PendantConfig, #[case] needle: &str) {
    let err = Pendant::builder()
        .with_panel(SimulatedPanel::default())
        .with_bus(RecordingBus::new())
        .with_config(cfg)
        .build()
        .expect_err("invalid config");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn boxed_pendant_runs_with_default_enable_line() {
    let bus = RecordingBus::new();
    let mut pendant = Pendant::builder()
        .with_panel(SimulatedPanel::default())
        .with_bus(bus.clone())
        .build()
        .expect("build");
    pendant.begin().expect("begin");
    assert_eq!(bus.frames().len(), 3);
    let report = pendant.step();
    assert!(!report.output_enabled);
    assert_eq!(pendant.wiper_value(Axis::Z), 8192);
    pendant.shutdown().expect("shutdown");
}

#[rstest]
fn fixed_panel_holds_selection() {
    let levels = PanelLevels {
        axis: [false, true, false],
        speed: [false, true, false],
        adaptive: false,
    };
    let mut pendant = Pendant::builder()
        .with_panel(FixedPanel(levels))
        .with_bus(RecordingBus::new())
        .build()
        .expect("build");
    pendant.begin().expect("begin");
    let report = pendant.step();
    assert!(report.output_enabled);
    assert_eq!(report.axis, Some(Axis::Y));
    assert_eq!(report.mode, SpeedMode::X10);
}
