#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the jogwheel pendant.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Every section except `[pins]` defaults to the stock pendant constants,
//!   so a config file only needs to name the wiring plus what it changes.
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// GPIO numbers (BCM on a Raspberry Pi). Unused by the simulated backend but
/// always required so a config file is portable to real hardware.
#[derive(Debug, Deserialize, Clone)]
pub struct Pins {
    pub jog_a: u8,
    pub jog_b: u8,
    pub axis_x: u8,
    pub axis_y: u8,
    pub axis_z: u8,
    pub speed_x1: u8,
    pub speed_x10: u8,
    pub speed_x100: u8,
    pub adaptive: u8,
    pub enable_out: u8,
    pub sck: u8,
    pub mosi: u8,
    pub cs_x: u8,
    pub cs_y: u8,
    pub cs_z: u8,
}

impl Pins {
    fn all(&self) -> [(&'static str, u8); 15] {
        [
            ("jog_a", self.jog_a),
            ("jog_b", self.jog_b),
            ("axis_x", self.axis_x),
            ("axis_y", self.axis_y),
            ("axis_z", self.axis_z),
            ("speed_x1", self.speed_x1),
            ("speed_x10", self.speed_x10),
            ("speed_x100", self.speed_x100),
            ("adaptive", self.adaptive),
            ("enable_out", self.enable_out),
            ("sck", self.sck),
            ("mosi", self.mosi),
            ("cs_x", self.cs_x),
            ("cs_y", self.cs_y),
            ("cs_z", self.cs_z),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PotCfg {
    /// Wiper positions of the digital potentiometer (128 or 256 on MCP41xx parts)
    pub resolution: u16,
    /// Command byte that addresses the wiper register for a write
    pub wiper_address: u8,
    /// Full scale of the host's joystick ADC (14 bit on Marlin boards)
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AxisCfg {
    /// Reading the host reports with the stick at rest (see M119 on Marlin)
    pub center: u16,
    /// Per-axis override of `pulse.click_ms`
    pub click_pulse_ms: Option<u64>,
    /// Per-axis override of `pulse.jog_ms`
    pub jog_pulse_ms: Option<u64>,
}

impl Default for AxisCfg {
    fn default() -> Self {
        Self {
            center: 8192,
            click_pulse_ms: None,
            jog_pulse_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Axes {
    pub x: AxisCfg,
    pub y: AxisCfg,
    pub z: AxisCfg,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PulseCfg {
    /// Excursion length for isolated clicks (ms)
    pub click_ms: u64,
    /// Excursion length while cranking continuously (ms)
    pub jog_ms: u64,
    /// Click rate (clicks/s) at or above which a tick counts as continuous
    /// jogging. Defaults to 1.0 when absent, so only isolated clicks
    /// slower than one per second get the click width.
    pub jog_threshold_hz: Option<f32>,
    /// Always use the click width while the X1 detent is selected
    pub x1_click_only: bool,
}

impl Default for PulseCfg {
    fn default() -> Self {
        Self {
            click_ms: 100,
            jog_ms: 10,
            jog_threshold_hz: None,
            x1_click_only: true,
        }
    }
}

/// Offsets from center in potentiometer steps, one per detent.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpeedsCfg {
    pub x1: u16,
    pub x10: u16,
    pub x100: u16,
}

impl Default for SpeedsCfg {
    fn default() -> Self {
        Self {
            x1: 5,
            x10: 10,
            x100: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdaptiveCfg {
    pub min_speed: u16,
    pub max_speed: u16,
    pub min_click_hz: f32,
    pub max_click_hz: f32,
    /// A gap longer than this restarts the estimate from the minimum speed
    pub idle_reset_ms: u64,
}

impl Default for AdaptiveCfg {
    fn default() -> Self {
        Self {
            min_speed: 5,
            max_speed: 20,
            min_click_hz: 20.0,
            max_click_hz: 200.0,
            idle_reset_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelectorCfg {
    /// Disable output while the speed switch sits in its open position
    pub speed_switch_enable: bool,
    /// Switches pull to ground when closed
    pub active_low: bool,
}

impl Default for SelectorCfg {
    fn default() -> Self {
        Self {
            speed_switch_enable: true,
            active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Pause between control cycles (µs)
    pub loop_period_us: u64,
    /// Ticks buffered between the edge handler and the control loop
    pub tick_queue_capacity: usize,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            loop_period_us: 1000,
            tick_queue_capacity: 64,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub pot: PotCfg,
    #[serde(default)]
    pub axes: Axes,
    #[serde(default)]
    pub pulse: PulseCfg,
    #[serde(default)]
    pub speeds: SpeedsCfg,
    #[serde(default)]
    pub adaptive: AdaptiveCfg,
    #[serde(default)]
    pub selector: SelectorCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Why a config file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {}: {}", .path.display(), .source.message())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = load_toml(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate().map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let pins = self.pins.all();
        for (i, (name_a, pin_a)) in pins.iter().enumerate() {
            if let Some((name_b, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin_a) {
                eyre::bail!("pins.{name_a} and pins.{name_b} both use GPIO {pin_a}");
            }
        }

        // Potentiometer
        if self.pot.resolution < 2 || self.pot.resolution > 257 {
            eyre::bail!("pot.resolution must be in [2, 257]");
        }
        if self.pot.adc_full_scale == 0 {
            eyre::bail!("pot.adc_full_scale must be > 0");
        }

        // Axes
        for (name, axis) in [
            ("x", &self.axes.x),
            ("y", &self.axes.y),
            ("z", &self.axes.z),
        ] {
            if axis.center > self.pot.adc_full_scale {
                eyre::bail!("axes.{name}.center must be <= pot.adc_full_scale");
            }
            if axis.click_pulse_ms == Some(0) {
                eyre::bail!("axes.{name}.click_pulse_ms must be >= 1");
            }
            if axis.jog_pulse_ms == Some(0) {
                eyre::bail!("axes.{name}.jog_pulse_ms must be >= 1");
            }
        }

        // Pulse
        if self.pulse.click_ms == 0 {
            eyre::bail!("pulse.click_ms must be >= 1");
        }
        if self.pulse.jog_ms == 0 {
            eyre::bail!("pulse.jog_ms must be >= 1");
        }
        if let Some(hz) = self.pulse.jog_threshold_hz
            && !(hz.is_finite() && hz > 0.0)
        {
            eyre::bail!("pulse.jog_threshold_hz must be > 0");
        }

        // Magnitudes must leave the wiper inside the device range
        let half_range = self.pot.resolution / 2;
        let largest = [
            self.speeds.x1,
            self.speeds.x10,
            self.speeds.x100,
            self.adaptive.max_speed,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if largest >= half_range {
            eyre::bail!("jog speeds must be < half of pot.resolution ({half_range})");
        }

        // Adaptive
        if self.adaptive.min_speed > self.adaptive.max_speed {
            eyre::bail!("adaptive.min_speed must be <= adaptive.max_speed");
        }
        if !(self.adaptive.min_click_hz.is_finite() && self.adaptive.min_click_hz > 0.0) {
            eyre::bail!("adaptive.min_click_hz must be > 0");
        }
        if !self.adaptive.max_click_hz.is_finite()
            || self.adaptive.max_click_hz < self.adaptive.min_click_hz
        {
            eyre::bail!("adaptive.max_click_hz must be >= adaptive.min_click_hz");
        }
        if self.adaptive.idle_reset_ms == 0 {
            eyre::bail!("adaptive.idle_reset_ms must be >= 1");
        }

        // Runner
        if self.runner.tick_queue_capacity == 0 {
            eyre::bail!("runner.tick_queue_capacity must be >= 1");
        }
        if self.runner.loop_period_us > 1_000_000 {
            eyre::bail!("runner.loop_period_us is unreasonably large (>1s)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
