//! `From` implementations bridging `pendant_config` types to `pendant_core` types.

use std::time::Duration;

use crate::axis::AxisMap;
use crate::config::{AdaptiveCfg, AxisCfg, PendantConfig, PotCfg, PulseCfg, SpeedTable};

// ── PotCfg ───────────────────────────────────────────────────────────────────

impl From<&pendant_config::PotCfg> for PotCfg {
    fn from(c: &pendant_config::PotCfg) -> Self {
        Self {
            resolution: c.resolution,
            wiper_address: c.wiper_address,
            adc_full_scale: c.adc_full_scale,
        }
    }
}

// ── SpeedTable ───────────────────────────────────────────────────────────────

impl From<&pendant_config::SpeedsCfg> for SpeedTable {
    fn from(c: &pendant_config::SpeedsCfg) -> Self {
        Self {
            x1: c.x1,
            x10: c.x10,
            x100: c.x100,
        }
    }
}

// ── AdaptiveCfg ──────────────────────────────────────────────────────────────

impl From<&pendant_config::AdaptiveCfg> for AdaptiveCfg {
    fn from(c: &pendant_config::AdaptiveCfg) -> Self {
        Self {
            min_speed: c.min_speed,
            max_speed: c.max_speed,
            min_click_hz: c.min_click_hz,
            max_click_hz: c.max_click_hz,
            idle_reset: Duration::from_millis(c.idle_reset_ms),
        }
    }
}

// ── AxisCfg ──────────────────────────────────────────────────────────────────

/// Per-axis pulse widths fall back to the `[pulse]` section.
fn axis_cfg(c: &pendant_config::AxisCfg, pulse: &pendant_config::PulseCfg) -> AxisCfg {
    AxisCfg {
        center: c.center,
        click_pulse: Duration::from_millis(c.click_pulse_ms.unwrap_or(pulse.click_ms)),
        jog_pulse: Duration::from_millis(c.jog_pulse_ms.unwrap_or(pulse.jog_ms)),
    }
}

// ── PendantConfig ────────────────────────────────────────────────────────────

impl From<&pendant_config::Config> for PendantConfig {
    fn from(c: &pendant_config::Config) -> Self {
        let axes = AxisMap([
            axis_cfg(&c.axes.x, &c.pulse),
            axis_cfg(&c.axes.y, &c.pulse),
            axis_cfg(&c.axes.z, &c.pulse),
        ]);
        Self {
            pot: PotCfg::from(&c.pot),
            axes,
            pulse: PulseCfg {
                jog_threshold_hz: c
                    .pulse
                    .jog_threshold_hz
                    .unwrap_or_else(|| PulseCfg::default().jog_threshold_hz),
                x1_click_only: c.pulse.x1_click_only,
            },
            speeds: SpeedTable::from(&c.speeds),
            adaptive: AdaptiveCfg::from(&c.adaptive),
            speed_switch_enable: c.selector.speed_switch_enable,
            loop_period: Duration::from_micros(c.runner.loop_period_us),
            tick_queue_capacity: c.runner.tick_queue_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;

    const PINS: &str = r#"
        [pins]
        jog_a = 17
        jog_b = 27
        axis_x = 19
        axis_y = 26
        axis_z = 21
        speed_x1 = 5
        speed_x10 = 6
        speed_x100 = 13
        adaptive = 20
        enable_out = 24
        sck = 11
        mosi = 10
        cs_x = 8
        cs_y = 7
        cs_z = 25
    "#;

    #[test]
    fn stock_file_matches_runtime_defaults() {
        let file = pendant_config::load_toml(PINS).expect("parse");
        let cfg = PendantConfig::from(&file);
        let stock = PendantConfig::default();
        assert_eq!(cfg.pot.resolution, stock.pot.resolution);
        assert_eq!(cfg.axes[Axis::Z].center, stock.axes[Axis::Z].center);
        assert_eq!(cfg.axes[Axis::X].click_pulse, stock.axes[Axis::X].click_pulse);
        assert_eq!(cfg.pulse.jog_threshold_hz, stock.pulse.jog_threshold_hz);
        assert_eq!(cfg.adaptive.idle_reset, stock.adaptive.idle_reset);
        assert_eq!(cfg.loop_period, stock.loop_period);
        assert_eq!(cfg.tick_queue_capacity, stock.tick_queue_capacity);
    }

    #[test]
    fn axis_override_beats_pulse_section() {
        let toml = format!("{PINS}\n[pulse]\nclick_ms = 80\n[axes.y]\nclick_pulse_ms = 150\n");
        let file = pendant_config::load_toml(&toml).expect("parse");
        let cfg = PendantConfig::from(&file);
        assert_eq!(cfg.axes[Axis::X].click_pulse, Duration::from_millis(80));
        assert_eq!(cfg.axes[Axis::Y].click_pulse, Duration::from_millis(150));
    }
}
