//! The joystick emulation control loop (`JoystickController`).
//!
//! One `step()` is one control cycle: sample the clock once, resolve the
//! selector switches, drive the enable output, consume queued encoder ticks,
//! expire pulses and push any changed wiper value to the potentiometers.
//! There is no terminal state; the caller decides when to stop.

use std::sync::Arc;
use std::time::Instant;

use pendant_traits::{ChipSelectBus, Clock, EnableLine, Panel, PanelLevels};

use crate::adaptive::AdaptiveSpeedEstimator;
use crate::axis::{Axis, AxisSelector};
use crate::config::PendantConfig;
use crate::decoder::{EdgeDecoder, EncoderTick};
use crate::driver::{PotentiometerDriver, WriteOutcome};
use crate::error::{PendantError, Result};
use crate::hw_error::map_hw_error;
use crate::pulse::{PulseGenerator, PulseUpdate, PulseWidth};
use crate::queue::TickQueue;
use crate::speed::{SpeedMode, SpeedModeSelector, SpeedSelection};

/// Clock handle shared between the loop and the edge handlers.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Running counters, cumulative since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub cycles: u64,
    pub ticks_consumed: u64,
    /// Ticks dropped because output was disabled or no pulse could be sized.
    pub ticks_discarded_disabled: u64,
    /// Ticks dropped because no single axis was selected.
    pub ticks_discarded_no_axis: u64,
    pub pulses_started: u64,
    pub pulses_extended: u64,
    pub pulses_replaced: u64,
    pub pulses_expired: u64,
    pub bus_writes: u64,
    pub bus_errors: u64,
    pub panel_errors: u64,
    pub enable_errors: u64,
    pub queue_overflows: u64,
    pub invalid_transitions: u64,
}

/// What happened in one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub now: Instant,
    pub axis: Option<Axis>,
    pub mode: SpeedMode,
    pub output_enabled: bool,
    pub ticks: usize,
    pub writes: usize,
    pub write_failures: usize,
}

pub struct JoystickController<P, B, E> {
    pub(crate) panel: P,
    pub(crate) driver: PotentiometerDriver<B>,
    pub(crate) enable: E,
    pub(crate) cfg: PendantConfig,
    pub(crate) clock: SharedClock,
    pub(crate) queue: Arc<TickQueue>,
    pub(crate) decoder: Option<Arc<EdgeDecoder<SharedClock>>>,
    pub(crate) estimator: AdaptiveSpeedEstimator,
    pub(crate) pulses: PulseGenerator,

    pub(crate) inhibited: bool,
    /// Level last driven successfully on the enable output.
    pub(crate) enable_driven: Option<bool>,
    pub(crate) axis: Option<Axis>,
    pub(crate) speed: SpeedSelection,
    pub(crate) stats: ControllerStats,
}

impl<P, B, E> core::fmt::Debug for JoystickController<P, B, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JoystickController")
            .field("axis", &self.axis)
            .field("mode", &self.speed.mode)
            .field("inhibited", &self.inhibited)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<P: Panel, B: ChipSelectBus, E: EnableLine> JoystickController<P, B, E> {
    /// Power-up initialization: every axis to center, once.
    pub fn begin(&mut self) -> Result<()> {
        self.pulses.clear();
        self.estimator.reset();
        self.driver.invalidate();
        let mut failed = Vec::new();
        for axis in Axis::ALL {
            let center = self.cfg.center(axis);
            match self.driver.write(axis, center) {
                WriteOutcome::Written(_) | WriteOutcome::Unchanged => self.stats.bus_writes += 1,
                WriteOutcome::Failed => {
                    self.stats.bus_errors += 1;
                    failed.push(axis.name());
                }
            }
        }
        if !failed.is_empty() {
            return Err(eyre::Report::new(PendantError::HardwareFault(format!(
                "could not center axes: {}",
                failed.join(", ")
            ))));
        }
        tracing::info!(
            centers = ?self.cfg.axes.0.iter().map(|a| a.center).collect::<Vec<_>>(),
            "pendant initialized"
        );
        Ok(())
    }

    /// One control cycle.
    pub fn step(&mut self) -> CycleReport {
        let now = self.clock.now();
        self.stats.cycles += 1;

        let levels = self.sample_panel();
        let axis = AxisSelector::resolve(&levels.axis);
        let speed = SpeedModeSelector::resolve(&levels, self.cfg.speed_switch_enable);
        if axis != self.axis {
            tracing::debug!(from = ?self.axis, to = ?axis, "axis selection changed");
            self.axis = axis;
        }
        if speed != self.speed {
            tracing::debug!(
                from = self.speed.mode.name(),
                to = speed.mode.name(),
                output_enabled = speed.output_enabled,
                "speed selection changed"
            );
            self.speed = speed;
        }

        let output_enabled = speed.output_enabled && !self.inhibited;
        self.drive_enable(output_enabled);

        let queue = Arc::clone(&self.queue);
        let mut ticks = 0usize;
        if output_enabled {
            for tick in queue.drain() {
                ticks += 1;
                self.consume(tick, axis, speed, now);
            }
        } else {
            let dropped = queue.drain().count();
            ticks = dropped;
            self.stats.ticks_discarded_disabled += dropped as u64;
            if self.pulses.any_active() {
                tracing::debug!("output disabled, centering all axes");
            }
            self.pulses.clear();
            self.estimator.reset();
        }

        let ended = self.pulses.expire(now);
        for (axis, done) in ended.iter() {
            if *done {
                self.stats.pulses_expired += 1;
                tracing::trace!(axis = %axis, "pulse expired");
            }
        }

        let (writes, write_failures) = self.write_all();

        CycleReport {
            now,
            axis,
            mode: speed.mode,
            output_enabled,
            ticks,
            writes,
            write_failures,
        }
    }

    fn consume(
        &mut self,
        tick: EncoderTick,
        axis: Option<Axis>,
        speed: SpeedSelection,
        now: Instant,
    ) {
        let measured = self.estimator.observe(&self.cfg.adaptive, tick.at);
        let Some(axis) = axis else {
            self.stats.ticks_discarded_no_axis += 1;
            return;
        };
        let magnitude = match (speed.mode, speed.detent) {
            (SpeedMode::Adaptive, _) => measured.speed,
            (SpeedMode::X1 | SpeedMode::X10 | SpeedMode::X100, Some(detent)) => {
                self.cfg.speeds.magnitude(detent)
            }
            _ => {
                self.stats.ticks_discarded_disabled += 1;
                return;
            }
        };
        let width = PulseWidth::classify(&self.cfg.pulse, speed.detent, measured.rate_hz);
        let duration = self.cfg.axes[axis].pulse_duration(width);
        let update = self
            .pulses
            .apply(axis, tick.direction, magnitude, duration, now);
        self.stats.ticks_consumed += 1;
        match update {
            PulseUpdate::Started => self.stats.pulses_started += 1,
            PulseUpdate::Extended => self.stats.pulses_extended += 1,
            PulseUpdate::Replaced => self.stats.pulses_replaced += 1,
        }
        tracing::trace!(
            axis = %axis,
            direction = ?tick.direction,
            magnitude,
            width = width.name(),
            rate_hz = measured.rate_hz,
            "tick"
        );
    }

    fn write_all(&mut self) -> (usize, usize) {
        let mut writes = 0;
        let mut failures = 0;
        for axis in Axis::ALL {
            let wiper = self.wiper_value(axis);
            match self.driver.write(axis, wiper) {
                WriteOutcome::Unchanged => {}
                WriteOutcome::Written(_) => {
                    writes += 1;
                    self.stats.bus_writes += 1;
                }
                WriteOutcome::Failed => {
                    failures += 1;
                    self.stats.bus_errors += 1;
                }
            }
        }
        (writes, failures)
    }

    fn sample_panel(&mut self) -> PanelLevels {
        match self.panel.sample() {
            Ok(levels) => levels,
            Err(e) => {
                self.stats.panel_errors += 1;
                tracing::warn!(error = %map_hw_error(&*e), "panel read failed, treating as released");
                PanelLevels::default()
            }
        }
    }

    fn drive_enable(&mut self, enabled: bool) {
        if self.enable_driven == Some(enabled) {
            return;
        }
        match self.enable.set_enabled(enabled) {
            Ok(()) => {
                tracing::debug!(enabled, "joystick enable output");
                self.enable_driven = Some(enabled);
            }
            Err(e) => {
                self.stats.enable_errors += 1;
                self.enable_driven = None;
                tracing::warn!(enabled, error = %map_hw_error(&*e), "enable output failed");
            }
        }
    }

    /// Force output off regardless of the speed switch (or release it).
    pub fn inhibit(&mut self, inhibited: bool) {
        if self.inhibited != inhibited {
            tracing::info!(inhibited, "output inhibit");
        }
        self.inhibited = inhibited;
    }

    /// Center every axis and drop the enable output.
    pub fn shutdown(&mut self) -> Result<()> {
        self.pulses.clear();
        let _ = self.queue.drain().count();
        let (_, failures) = self.write_all();
        let enable = self.enable.set_enabled(false);
        self.enable_driven = None;
        tracing::info!("pendant stopped");
        if failures > 0 {
            return Err(eyre::Report::new(PendantError::HardwareFault(format!(
                "{failures} axes could not be centered"
            ))));
        }
        enable.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }
}

impl<P, B, E> JoystickController<P, B, E> {
    /// Wiper value for `axis` in host units: center plus any live pulse.
    pub fn wiper_value(&self, axis: Axis) -> i32 {
        self.cfg.center(axis) + self.pulses.offset(axis)
    }

    /// Queue the edge handlers push into.
    pub fn tick_queue(&self) -> Arc<TickQueue> {
        Arc::clone(&self.queue)
    }

    /// Create the shared decoder for interrupt-driven inputs.
    ///
    /// `a`/`b` are the line levels read at startup. The decoder is kept so
    /// its invalid-transition count shows up in [`stats`](Self::stats).
    pub fn attach_decoder(&mut self, a: bool, b: bool) -> Arc<EdgeDecoder<SharedClock>> {
        let decoder = Arc::new(EdgeDecoder::new(
            a,
            b,
            Arc::clone(&self.queue),
            Arc::clone(&self.clock),
        ));
        self.decoder = Some(Arc::clone(&decoder));
        decoder
    }

    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            queue_overflows: self.queue.overflowed(),
            invalid_transitions: self
                .decoder
                .as_ref()
                .map_or(0, |d| d.invalid_transitions()),
            ..self.stats
        }
    }

    pub fn config(&self) -> &PendantConfig {
        &self.cfg
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn active_axis(&self) -> Option<Axis> {
        self.axis
    }

    pub fn speed_selection(&self) -> SpeedSelection {
        self.speed
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibited
    }

    /// Smoothed click interval, for telemetry.
    pub fn click_interval_ms(&self) -> Option<f32> {
        self.estimator.interval_ema_ms()
    }

    pub fn last_code(&self, axis: Axis) -> Option<u16> {
        self.driver.last_code(axis)
    }

    pub fn bus(&self) -> &B {
        self.driver.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.driver.bus_mut()
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn enable_line(&self) -> &E {
        &self.enable
    }
}
