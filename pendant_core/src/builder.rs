//! Type-state builder for `Pendant` and generic `build_pendant` constructor.
//!
//! The builder enforces at compile time that a panel and a potentiometer bus
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use pendant_traits::clock::{Clock, MonotonicClock};
use pendant_traits::{ChipSelectBus, EnableLine, Panel};

use crate::adaptive::AdaptiveSpeedEstimator;
use crate::axis::{Axis, AxisMap};
use crate::config::PendantConfig;
use crate::controller::{ControllerStats, CycleReport, JoystickController, SharedClock};
use crate::decoder::EdgeDecoder;
use crate::driver::PotentiometerDriver;
use crate::error::{BuildError, Result};
use crate::mocks::NoopEnableLine;
use crate::pulse::PulseGenerator;
use crate::queue::TickQueue;
use crate::speed::SpeedSelection;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

type BoxedController = JoystickController<Box<dyn Panel>, Box<dyn ChipSelectBus>, Box<dyn EnableLine>>;

/// Boxed pendant controller for callers that pick backends at runtime.
pub struct Pendant {
    pub(crate) inner: BoxedController,
}

impl core::fmt::Debug for Pendant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Pendant {
    /// Start building a Pendant.
    pub fn builder() -> PendantBuilder<Missing, Missing> {
        PendantBuilder::default()
    }

    /// Center every axis once. Call before the first `step`.
    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One control cycle.
    pub fn step(&mut self) -> CycleReport {
        self.inner.step()
    }

    /// Run the control loop until `shutdown` is raised; see [`crate::runner::run`].
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<ControllerStats> {
        crate::runner::run(&mut self.inner, shutdown, |_| {})
    }

    pub fn inhibit(&mut self, inhibited: bool) {
        self.inner.inhibit(inhibited);
    }

    /// Center every axis and drop the enable output.
    pub fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }

    pub fn wiper_value(&self, axis: Axis) -> i32 {
        self.inner.wiper_value(axis)
    }

    pub fn tick_queue(&self) -> Arc<TickQueue> {
        self.inner.tick_queue()
    }

    pub fn attach_decoder(&mut self, a: bool, b: bool) -> Arc<EdgeDecoder<SharedClock>> {
        self.inner.attach_decoder(a, b)
    }

    pub fn stats(&self) -> ControllerStats {
        self.inner.stats()
    }

    pub fn config(&self) -> &PendantConfig {
        self.inner.config()
    }

    pub fn clock(&self) -> &SharedClock {
        self.inner.clock()
    }

    pub fn speed_selection(&self) -> SpeedSelection {
        self.inner.speed_selection()
    }

    /// Telemetry: smoothed click interval in milliseconds.
    pub fn click_interval_ms(&self) -> Option<f32> {
        self.inner.click_interval_ms()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Pendant`. The configuration is validated on `build()`.
pub struct PendantBuilder<P, B> {
    panel: Option<Box<dyn Panel>>,
    bus: Option<Box<dyn ChipSelectBus>>,
    enable: Option<Box<dyn EnableLine>>,
    config: Option<PendantConfig>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _p: PhantomData<P>,
    _b: PhantomData<B>,
}

impl Default for PendantBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            panel: None,
            bus: None,
            enable: None,
            config: None,
            clock: None,
            _p: PhantomData,
            _b: PhantomData,
        }
    }
}

/// Validate configuration and construct a `JoystickController`.
///
/// Shared by `PendantBuilder::try_build()` and `build_pendant()`.
fn validate_and_build<P: Panel, B: ChipSelectBus, E: EnableLine>(
    panel: P,
    bus: B,
    enable: E,
    cfg: PendantConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<JoystickController<P, B, E>> {
    validate(&cfg).map_err(eyre::Report::new)?;

    let clock: SharedClock = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let centers = AxisMap::from_fn(|a| cfg.axes[a].center);
    let driver = PotentiometerDriver::new(bus, cfg.pot.clone(), centers);
    let queue = Arc::new(TickQueue::new(cfg.tick_queue_capacity));

    Ok(JoystickController {
        panel,
        driver,
        enable,
        cfg,
        clock,
        queue,
        decoder: None,
        estimator: AdaptiveSpeedEstimator::new(),
        pulses: PulseGenerator::new(),
        inhibited: false,
        enable_driven: None,
        axis: None,
        speed: SpeedSelection::DISABLED,
        stats: ControllerStats::default(),
    })
}

fn validate(cfg: &PendantConfig) -> std::result::Result<(), BuildError> {
    let res = cfg.pot.resolution;
    if !(2..=257).contains(&res) {
        return Err(BuildError::InvalidConfig("pot resolution must be in 2..=257"));
    }
    if cfg.pot.adc_full_scale == 0 {
        return Err(BuildError::InvalidConfig("adc_full_scale must be > 0"));
    }
    for (_, axis) in cfg.axes.iter() {
        if axis.center > cfg.pot.adc_full_scale {
            return Err(BuildError::InvalidConfig("axis center exceeds adc_full_scale"));
        }
        if axis.click_pulse.is_zero() || axis.jog_pulse.is_zero() {
            return Err(BuildError::InvalidConfig("pulse widths must be > 0"));
        }
    }
    let widest = cfg
        .speeds
        .x1
        .max(cfg.speeds.x10)
        .max(cfg.speeds.x100)
        .max(cfg.adaptive.max_speed);
    if widest >= res / 2 {
        return Err(BuildError::InvalidConfig(
            "jog speeds must be < half of pot resolution",
        ));
    }
    let a = &cfg.adaptive;
    if a.min_speed > a.max_speed {
        return Err(BuildError::InvalidConfig("adaptive min_speed > max_speed"));
    }
    if !(a.min_click_hz > 0.0) || !(a.max_click_hz >= a.min_click_hz) {
        return Err(BuildError::InvalidConfig("adaptive click rate range is invalid"));
    }
    if a.idle_reset.is_zero() {
        return Err(BuildError::InvalidConfig("idle_reset must be > 0"));
    }
    if !(cfg.pulse.jog_threshold_hz > 0.0) {
        return Err(BuildError::InvalidConfig("jog_threshold_hz must be > 0"));
    }
    if cfg.tick_queue_capacity == 0 {
        return Err(BuildError::InvalidConfig("tick queue capacity must be >= 1"));
    }
    Ok(())
}

impl<P, B> PendantBuilder<P, B> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Pendant> {
        let panel = self
            .panel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPanel))?;
        let bus = self
            .bus
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBus))?;
        let enable: Box<dyn EnableLine> = self.enable.unwrap_or_else(|| Box::new(NoopEnableLine));

        let inner = validate_and_build(
            panel,
            bus,
            enable,
            self.config.unwrap_or_default(),
            self.clock,
        )?;
        Ok(Pendant { inner })
    }

    pub fn with_config(mut self, config: PendantConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_enable_line(mut self, enable: impl EnableLine + 'static) -> Self {
        self.enable = Some(Box::new(enable));
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<B> PendantBuilder<Missing, B> {
    pub fn with_panel(self, panel: impl Panel + 'static) -> PendantBuilder<Set, B> {
        PendantBuilder {
            panel: Some(Box::new(panel)),
            bus: self.bus,
            enable: self.enable,
            config: self.config,
            clock: self.clock,
            _p: PhantomData,
            _b: PhantomData,
        }
    }
}

impl<P> PendantBuilder<P, Missing> {
    pub fn with_bus(self, bus: impl ChipSelectBus + 'static) -> PendantBuilder<P, Set> {
        PendantBuilder {
            panel: self.panel,
            bus: Some(Box::new(bus)),
            enable: self.enable,
            config: self.config,
            clock: self.clock,
            _p: PhantomData,
            _b: PhantomData,
        }
    }
}

impl PendantBuilder<Set, Set> {
    /// Validate and build. Only available once panel and bus are set.
    pub fn build(self) -> Result<Pendant> {
        self.try_build()
    }
}

/// Generic, statically-dispatched controller.
pub type PendantG<P, B, E> = JoystickController<P, B, E>;

/// Build a statically-dispatched `PendantG` from concrete backends.
pub fn build_pendant<P, B, E>(
    panel: P,
    bus: B,
    enable: E,
    config: PendantConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<PendantG<P, B, E>>
where
    P: Panel,
    B: ChipSelectBus,
    E: EnableLine,
{
    validate_and_build(panel, bus, enable, config, clock)
}
