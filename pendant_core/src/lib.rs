#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core jog pendant logic (hardware-agnostic).
//!
//! Turns jogwheel clicks into timed joystick deflections on three digital
//! potentiometers. All hardware interactions go through the
//! `pendant_traits::Panel`, `ChipSelectBus` and `EnableLine` traits.
//!
//! ## Architecture
//!
//! - **Decoding**: quadrature table and the interrupt-side decoder (`decoder`)
//! - **Hand-off**: bounded drop-oldest tick queue (`queue`)
//! - **Selection**: axis and speed-mode switches (`axis`, `speed`)
//! - **Speed**: adaptive magnitude from click rate (`adaptive`)
//! - **Pulses**: per-axis timed deflections (`pulse`)
//! - **Output**: MCP4151 wiper writes with change suppression (`driver`)
//! - **Control**: the per-cycle loop (`controller`, `runner`)
//!
//! ## Units
//!
//! Wiper values are in host joystick units (ADC counts, center 8192 of 16384).
//! Jog magnitudes are in potentiometer steps. `driver::center_code` relates
//! the two.

pub mod adaptive;
pub mod axis;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod pulse;
pub mod queue;
pub mod runner;
pub mod speed;

pub use adaptive::{AdaptiveSpeedEstimator, ClickMeasurement};
pub use axis::{Axis, AxisMap, AxisSelector};
pub use builder::{build_pendant, Missing, Pendant, PendantBuilder, PendantG, Set};
pub use config::{AdaptiveCfg, AxisCfg, PendantConfig, PotCfg, PulseCfg, SpeedTable};
pub use controller::{ControllerStats, CycleReport, JoystickController, SharedClock};
pub use decoder::{Direction, EdgeDecoder, EncoderTick, QuadratureDecoder};
pub use driver::{PotentiometerDriver, WriteOutcome};
pub use error::{BuildError, PendantError, Result};
pub use pulse::{Pulse, PulseGenerator, PulseUpdate, PulseWidth};
pub use queue::TickQueue;
pub use speed::{Detent, SpeedMode, SpeedModeSelector, SpeedSelection};
