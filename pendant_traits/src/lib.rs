pub mod clock;

pub use clock::{Clock, MonotonicClock};

#[cfg(any(test, feature = "manual-clock"))]
pub use clock::manual::ManualClock;

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Selector inputs as seen in one sample, already translated to
/// "asserted" semantics (polarity is the backend's concern).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelLevels {
    /// X, Y, Z axis-select switches.
    pub axis: [bool; 3],
    /// X1, X10, X100 speed-mode switches.
    pub speed: [bool; 3],
    /// Adaptive speed enable.
    pub adaptive: bool,
}

/// Axis and speed selector switches on the pendant.
pub trait Panel {
    fn sample(&mut self) -> HwResult<PanelLevels>;
}

/// Shared clock/data serial bus with one chip-select line per device.
///
/// Devices are addressed by index (0 = X, 1 = Y, 2 = Z). Chip-select is
/// active low; `select` drives it low, `deselect` drives it high.
pub trait ChipSelectBus {
    fn select(&mut self, device: usize) -> HwResult<()>;
    fn shift_out(&mut self, byte: u8) -> HwResult<()>;
    fn deselect(&mut self, device: usize) -> HwResult<()>;
}

/// Joystick enable output towards the host controller.
pub trait EnableLine {
    fn set_enabled(&mut self, enabled: bool) -> HwResult<()>;
}

impl<T: Panel + ?Sized> Panel for Box<T> {
    fn sample(&mut self) -> HwResult<PanelLevels> {
        (**self).sample()
    }
}

impl<T: ChipSelectBus + ?Sized> ChipSelectBus for Box<T> {
    fn select(&mut self, device: usize) -> HwResult<()> {
        (**self).select(device)
    }
    fn shift_out(&mut self, byte: u8) -> HwResult<()> {
        (**self).shift_out(byte)
    }
    fn deselect(&mut self, device: usize) -> HwResult<()> {
        (**self).deselect(device)
    }
}

impl<T: EnableLine + ?Sized> EnableLine for Box<T> {
    fn set_enabled(&mut self, enabled: bool) -> HwResult<()> {
        (**self).set_enabled(enabled)
    }
}
