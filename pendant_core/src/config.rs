//! Runtime configuration for the pendant controller.
//!
//! Built once at startup (usually from `pendant_config::Config`, see
//! `conversions`) and never mutated afterwards. Components receive the
//! section they need by reference.

use std::time::Duration;

use crate::axis::{Axis, AxisMap};
use crate::pulse::PulseWidth;
use crate::speed::Detent;

/// Digital potentiometer geometry and the host's ADC scale.
#[derive(Debug, Clone)]
pub struct PotCfg {
    pub resolution: u16,
    pub wiper_address: u8,
    pub adc_full_scale: u16,
}

impl Default for PotCfg {
    fn default() -> Self {
        Self {
            resolution: 256,
            wiper_address: 0x00,
            adc_full_scale: 16384,
        }
    }
}

/// Per-axis calibration and pulse widths.
#[derive(Debug, Clone)]
pub struct AxisCfg {
    /// Joystick reading at rest, in host ADC units.
    pub center: u16,
    pub click_pulse: Duration,
    pub jog_pulse: Duration,
}

impl AxisCfg {
    pub fn pulse_duration(&self, width: PulseWidth) -> Duration {
        match width {
            PulseWidth::Click => self.click_pulse,
            PulseWidth::Jog => self.jog_pulse,
        }
    }
}

impl Default for AxisCfg {
    fn default() -> Self {
        Self {
            center: 8192,
            click_pulse: Duration::from_millis(100),
            jog_pulse: Duration::from_millis(10),
        }
    }
}

/// Pulse width class selection.
#[derive(Debug, Clone)]
pub struct PulseCfg {
    /// Click rate (clicks/s) at or above which ticks are treated as jogging.
    pub jog_threshold_hz: f32,
    /// Force click-width pulses while the X1 detent is selected.
    pub x1_click_only: bool,
}

impl Default for PulseCfg {
    fn default() -> Self {
        Self {
            jog_threshold_hz: 1.0,
            x1_click_only: true,
        }
    }
}

/// Offset from center for each detent, in potentiometer steps.
#[derive(Debug, Clone)]
pub struct SpeedTable {
    pub x1: u16,
    pub x10: u16,
    pub x100: u16,
}

impl SpeedTable {
    #[inline]
    pub fn magnitude(&self, detent: Detent) -> u16 {
        match detent {
            Detent::X1 => self.x1,
            Detent::X10 => self.x10,
            Detent::X100 => self.x100,
        }
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            x1: 5,
            x10: 10,
            x100: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveCfg {
    pub min_speed: u16,
    pub max_speed: u16,
    pub min_click_hz: f32,
    pub max_click_hz: f32,
    pub idle_reset: Duration,
}

impl Default for AdaptiveCfg {
    fn default() -> Self {
        Self {
            min_speed: 5,
            max_speed: 20,
            min_click_hz: 20.0,
            max_click_hz: 200.0,
            idle_reset: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendantConfig {
    pub pot: PotCfg,
    pub axes: AxisMap<AxisCfg>,
    pub pulse: PulseCfg,
    pub speeds: SpeedTable,
    pub adaptive: AdaptiveCfg,
    /// Disable output while the speed switch is open.
    pub speed_switch_enable: bool,
    /// Pause between control cycles.
    pub loop_period: Duration,
    pub tick_queue_capacity: usize,
}

impl Default for PendantConfig {
    fn default() -> Self {
        Self {
            pot: PotCfg::default(),
            axes: AxisMap::from_fn(|_| AxisCfg::default()),
            pulse: PulseCfg::default(),
            speeds: SpeedTable::default(),
            adaptive: AdaptiveCfg::default(),
            speed_switch_enable: true,
            loop_period: Duration::from_millis(1),
            tick_queue_capacity: 64,
        }
    }
}

impl PendantConfig {
    #[inline]
    pub fn center(&self, axis: Axis) -> i32 {
        i32::from(self.axes[axis].center)
    }
}
