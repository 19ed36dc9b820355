//! MCP4151 wiper writes over a shared chip-select bus.
//!
//! Wiper values arrive in host joystick units and are converted to device
//! codes here. Each write is one two-byte frame framed by the axis'
//! chip-select: command byte (wiper address, D9..D8 in the low bits) then the
//! low eight data bits.

use eyre::WrapErr;
use pendant_traits::{ChipSelectBus, HwResult};

use crate::axis::{Axis, AxisMap};
use crate::config::PotCfg;
use crate::hw_error::map_hw_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cached code already matches; no bus traffic.
    Unchanged,
    Written(u16),
    Failed,
}

pub struct PotentiometerDriver<B> {
    bus: B,
    pot: PotCfg,
    /// Device code per axis at host center.
    center_codes: AxisMap<i32>,
    centers: AxisMap<i32>,
    /// Last successfully written code; `None` forces the next write.
    last: AxisMap<Option<u16>>,
    writes: u64,
    errors: u64,
}

impl<B> core::fmt::Debug for PotentiometerDriver<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PotentiometerDriver")
            .field("last", &self.last)
            .field("writes", &self.writes)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Device code the host reads as `center`.
pub fn center_code(pot: &PotCfg, center: u16) -> i32 {
    let full = u32::from(pot.adc_full_scale.max(1));
    let scaled = u32::from(center) * u32::from(pot.resolution);
    // round half up
    i32::try_from((scaled + full / 2) / full).unwrap_or(i32::MAX)
}

impl<B: ChipSelectBus> PotentiometerDriver<B> {
    pub fn new(bus: B, pot: PotCfg, centers: AxisMap<u16>) -> Self {
        let center_codes = AxisMap::from_fn(|a| center_code(&pot, centers[a]));
        Self {
            bus,
            pot,
            center_codes,
            centers: AxisMap::from_fn(|a| i32::from(centers[a])),
            last: AxisMap([None; 3]),
            writes: 0,
            errors: 0,
        }
    }

    /// Device code for a wiper value, clamped to the pot's range.
    pub fn code_for(&self, axis: Axis, wiper: i32) -> u16 {
        let max = i32::from(self.pot.resolution.saturating_sub(1));
        let code = self.center_codes[axis]
            .saturating_add(wiper.saturating_sub(self.centers[axis]))
            .clamp(0, max);
        u16::try_from(code).unwrap_or(0)
    }

    /// Write `wiper` to `axis` unless the device already holds it.
    pub fn write(&mut self, axis: Axis, wiper: i32) -> WriteOutcome {
        let code = self.code_for(axis, wiper);
        if self.last[axis] == Some(code) {
            return WriteOutcome::Unchanged;
        }
        match self.write_code(axis, code) {
            Ok(()) => {
                self.last[axis] = Some(code);
                self.writes += 1;
                tracing::trace!(axis = %axis, wiper, code, "pot write");
                WriteOutcome::Written(code)
            }
            Err(e) => {
                self.last[axis] = None;
                self.errors += 1;
                tracing::warn!(axis = %axis, code, error = %format_args!("{e:#}"), "pot write failed");
                WriteOutcome::Failed
            }
        }
    }

    fn write_code(&mut self, axis: Axis, code: u16) -> crate::error::Result<()> {
        let [command, data] = frame(self.pot.wiper_address, code);
        let device = axis.index();
        self.bus
            .select(device)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("asserting chip-select")?;
        let shifted = shift_frame(&mut self.bus, command, data);
        let released = self.bus.deselect(device);
        shifted
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("shifting wiper frame")?;
        released
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("releasing chip-select")
    }

    /// Forget cached codes so every axis is rewritten on the next call.
    pub fn invalidate(&mut self) {
        self.last = AxisMap([None; 3]);
    }
}

impl<B> PotentiometerDriver<B> {
    pub fn last_code(&self, axis: Axis) -> Option<u16> {
        self.last[axis]
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

fn shift_frame<B: ChipSelectBus>(bus: &mut B, command: u8, data: u8) -> HwResult<()> {
    bus.shift_out(command)?;
    bus.shift_out(data)
}

/// Command and data bytes for a volatile wiper write.
#[inline]
pub fn frame(wiper_address: u8, code: u16) -> [u8; 2] {
    let [hi, lo] = code.to_be_bytes();
    [wiper_address | (hi & 0x03), lo]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pendant_traits::HwResult;

    #[derive(Default)]
    struct Log {
        ops: Vec<String>,
        fail_shift: bool,
    }

    impl ChipSelectBus for Log {
        fn select(&mut self, device: usize) -> HwResult<()> {
            self.ops.push(format!("cs{device}"));
            Ok(())
        }
        fn shift_out(&mut self, byte: u8) -> HwResult<()> {
            if self.fail_shift {
                return Err("shift failed".into());
            }
            self.ops.push(format!("{byte:02x}"));
            Ok(())
        }
        fn deselect(&mut self, device: usize) -> HwResult<()> {
            self.ops.push(format!("/cs{device}"));
            Ok(())
        }
    }

    fn driver() -> PotentiometerDriver<Log> {
        PotentiometerDriver::new(Log::default(), PotCfg::default(), AxisMap([8192; 3]))
    }

    #[test]
    fn center_maps_to_mid_scale() {
        let d = driver();
        assert_eq!(d.code_for(Axis::X, 8192), 128);
        assert_eq!(d.code_for(Axis::X, 8197), 133);
        assert_eq!(d.code_for(Axis::Y, 8192 - 20), 108);
    }

    #[test]
    fn codes_clamp_instead_of_wrapping() {
        let d = driver();
        assert_eq!(d.code_for(Axis::Z, 100_000), 255);
        assert_eq!(d.code_for(Axis::Z, -100_000), 0);
    }

    #[test]
    fn frame_is_cs_command_data_release() {
        let mut d = driver();
        assert_eq!(d.write(Axis::Y, 8197), WriteOutcome::Written(133));
        assert_eq!(d.bus().ops, vec!["cs1", "00", "85", "/cs1"]);
    }

    #[test]
    fn unchanged_value_skips_bus() {
        let mut d = driver();
        d.write(Axis::X, 8192);
        assert_eq!(d.write(Axis::X, 8192), WriteOutcome::Unchanged);
        assert_eq!(d.writes(), 1);
    }

    #[test]
    fn failed_shift_still_releases_and_retries() {
        let mut d = driver();
        d.bus_mut().fail_shift = true;
        assert_eq!(d.write(Axis::X, 8192), WriteOutcome::Failed);
        assert_eq!(d.bus().ops, vec!["cs0", "/cs0"]);
        assert_eq!(d.last_code(Axis::X), None);
        assert_eq!(d.errors(), 1);
        d.bus_mut().fail_shift = false;
        assert_eq!(d.write(Axis::X, 8192), WriteOutcome::Written(128));
    }

    fn cached<B>(d: &PotentiometerDriver<B>) -> [Option<u16>; 3] {
        Axis::ALL.map(|a| d.last_code(a))
    }

    #[test]
    fn accessors_need_no_bus_bound() {
        let mut d = driver();
        d.write(Axis::Z, 8192);
        assert_eq!(cached(&d), [None, None, Some(128)]);
        assert_eq!((d.writes(), d.errors()), (1, 0));
    }

    #[test]
    fn nine_bit_codes_use_command_low_bits() {
        assert_eq!(frame(0x00, 256), [0x01, 0x00]);
        assert_eq!(frame(0x10, 0x80), [0x10, 0x80]);
    }
}
