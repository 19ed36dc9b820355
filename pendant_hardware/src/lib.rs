//! Hardware backends for the jog pendant.
//!
//! `sim` is always available and backs the simulator and the test suites.
//! The `hardware` feature adds Raspberry Pi GPIO devices through `rppal`.

pub mod error;
pub mod sim;

#[cfg(feature = "hardware")]
pub mod gpio;

pub use sim::{BusFrame, RecordingBus, SimulatedEnableLine, SimulatedPanel};

#[cfg(feature = "hardware")]
pub use gpio::{BitBangBus, GpioEnableLine, GpioPanel, Jogwheel};

/// Open the GPIO controller.
#[cfg(feature = "hardware")]
pub fn open_gpio() -> error::Result<rppal::gpio::Gpio> {
    Ok(rppal::gpio::Gpio::new()?)
}
