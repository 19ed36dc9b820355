//! Simulated pendant hardware.
//!
//! Each device is a cheap handle over shared state, so a test or the
//! simulator can keep one clone and hand the other to the controller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pendant_traits::{ChipSelectBus, EnableLine, HwResult, Panel, PanelLevels};

use crate::error::HwError;

/// Selector switches driven from code.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPanel {
    levels: Rc<Cell<PanelLevels>>,
    fail_reads: Rc<Cell<u32>>,
}

impl SimulatedPanel {
    pub fn new(levels: PanelLevels) -> Self {
        Self {
            levels: Rc::new(Cell::new(levels)),
            fail_reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn set(&self, levels: PanelLevels) {
        self.levels.set(levels);
    }

    pub fn levels(&self) -> PanelLevels {
        self.levels.get()
    }

    /// Select one axis by index (0 = X), or none.
    pub fn select_axis(&self, axis: Option<usize>) {
        let mut l = self.levels.get();
        l.axis = [false; 3];
        if let Some(slot) = axis.and_then(|i| l.axis.get_mut(i)) {
            *slot = true;
        }
        self.levels.set(l);
    }

    /// Select one speed detent by index (0 = X1), or none.
    pub fn select_speed(&self, detent: Option<usize>) {
        let mut l = self.levels.get();
        l.speed = [false; 3];
        if let Some(slot) = detent.and_then(|i| l.speed.get_mut(i)) {
            *slot = true;
        }
        self.levels.set(l);
    }

    pub fn set_adaptive(&self, on: bool) {
        let mut l = self.levels.get();
        l.adaptive = on;
        self.levels.set(l);
    }

    /// Make the next `n` samples fail.
    pub fn fail_next_reads(&self, n: u32) {
        self.fail_reads.set(n);
    }
}

impl Panel for SimulatedPanel {
    fn sample(&mut self) -> HwResult<PanelLevels> {
        let pending = self.fail_reads.get();
        if pending > 0 {
            self.fail_reads.set(pending - 1);
            return Err(Box::new(HwError::Gpio("simulated panel read failure".into())));
        }
        Ok(self.levels.get())
    }
}

/// One completed chip-select transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    pub device: usize,
    pub bytes: Vec<u8>,
}

impl BusFrame {
    /// Wiper code carried by a two-byte MCP4151 write.
    pub fn code(&self) -> Option<u16> {
        match self.bytes.as_slice() {
            [command, data] => Some((u16::from(command & 0x03) << 8) | u16::from(*data)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct BusLog {
    selected: Option<usize>,
    pending: Vec<u8>,
    frames: Vec<BusFrame>,
    fail_shifts: u32,
    aborted: u64,
}

/// Records every chip-select frame; can inject shift failures.
///
/// Protocol misuse (overlapping selects, shifting with nothing selected,
/// releasing the wrong device) is reported as a bus error.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    log: Rc<RefCell<BusLog>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed frames so far.
    pub fn frames(&self) -> Vec<BusFrame> {
        self.log.borrow().frames.clone()
    }

    /// Completed frames since the last call.
    pub fn take_frames(&self) -> Vec<BusFrame> {
        std::mem::take(&mut self.log.borrow_mut().frames)
    }

    /// Make the next `n` byte shifts fail.
    pub fn fail_next_shifts(&self, n: u32) {
        self.log.borrow_mut().fail_shifts = n;
    }

    /// Transactions released before a byte failed to shift.
    pub fn aborted_frames(&self) -> u64 {
        self.log.borrow().aborted
    }

    /// Device whose chip-select is currently asserted.
    pub fn selected(&self) -> Option<usize> {
        self.log.borrow().selected
    }
}

impl ChipSelectBus for RecordingBus {
    fn select(&mut self, device: usize) -> HwResult<()> {
        let mut log = self.log.borrow_mut();
        if device >= 3 {
            return Err(Box::new(HwError::Bus(format!("no chip-select for device {device}"))));
        }
        if let Some(other) = log.selected {
            return Err(Box::new(HwError::Bus(format!(
                "chip-select {other} still asserted"
            ))));
        }
        log.selected = Some(device);
        log.pending.clear();
        Ok(())
    }

    fn shift_out(&mut self, byte: u8) -> HwResult<()> {
        let mut log = self.log.borrow_mut();
        if log.selected.is_none() {
            return Err(Box::new(HwError::Bus("shift with no device selected".into())));
        }
        if log.fail_shifts > 0 {
            log.fail_shifts -= 1;
            log.pending.clear();
            log.aborted += 1;
            return Err(Box::new(HwError::Bus("simulated shift failure".into())));
        }
        log.pending.push(byte);
        Ok(())
    }

    fn deselect(&mut self, device: usize) -> HwResult<()> {
        let mut log = self.log.borrow_mut();
        if log.selected != Some(device) {
            return Err(Box::new(HwError::Bus(format!(
                "release of device {device} which is not selected"
            ))));
        }
        log.selected = None;
        let bytes = std::mem::take(&mut log.pending);
        if !bytes.is_empty() {
            log.frames.push(BusFrame { device, bytes });
        }
        Ok(())
    }
}

/// Enable output that remembers its level.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEnableLine {
    level: Rc<Cell<Option<bool>>>,
    changes: Rc<Cell<u64>>,
    fail_writes: Rc<Cell<u32>>,
}

impl SimulatedEnableLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level driven, `None` before the first write.
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u64 {
        self.changes.get()
    }

    pub fn fail_next_writes(&self, n: u32) {
        self.fail_writes.set(n);
    }
}

impl EnableLine for SimulatedEnableLine {
    fn set_enabled(&mut self, enabled: bool) -> HwResult<()> {
        let pending = self.fail_writes.get();
        if pending > 0 {
            self.fail_writes.set(pending - 1);
            return Err(Box::new(HwError::Gpio("simulated enable failure".into())));
        }
        self.level.set(Some(enabled));
        self.changes.set(self.changes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_clones_share_levels() {
        let panel = SimulatedPanel::default();
        let mut handle = panel.clone();
        panel.select_axis(Some(2));
        panel.select_speed(Some(0));
        let l = handle.sample().unwrap();
        assert_eq!(l.axis, [false, false, true]);
        assert_eq!(l.speed, [true, false, false]);
    }

    #[test]
    fn bus_records_complete_frames() {
        let bus = RecordingBus::new();
        let mut dev = bus.clone();
        dev.select(1).unwrap();
        dev.shift_out(0x01).unwrap();
        dev.shift_out(0x00).unwrap();
        dev.deselect(1).unwrap();
        let frames = bus.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].device, 1);
        assert_eq!(frames[0].code(), Some(256));
    }

    #[test]
    fn overlapping_select_is_an_error() {
        let mut bus = RecordingBus::new();
        bus.select(0).unwrap();
        assert!(bus.select(1).is_err());
        assert!(bus.deselect(2).is_err());
        bus.deselect(0).unwrap();
    }

    #[test]
    fn injected_failure_aborts_frame() {
        let mut bus = RecordingBus::new();
        bus.fail_next_shifts(1);
        bus.select(0).unwrap();
        assert!(bus.shift_out(0x00).is_err());
        bus.deselect(0).unwrap();
        assert!(bus.frames().is_empty());
        assert_eq!(bus.aborted_frames(), 1);
    }
}
