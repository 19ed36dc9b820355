use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pendant_traits::{ChipSelectBus, Clock, EnableLine, Panel};

use crate::controller::{ControllerStats, CycleReport, JoystickController};
use crate::error::Result;

/// Time left in the current cycle, zero once the budget is spent.
#[inline]
fn remaining(period: Duration, spent: Duration) -> Duration {
    period.saturating_sub(spent)
}

/// Run the controller until `shutdown` is raised, then center every axis.
///
/// `on_cycle` sees every cycle report (telemetry, tests). Bus and panel
/// failures inside a cycle are counted, not returned; only initialization
/// and the final centering can fail the run.
pub fn run<P, B, E, F>(
    ctl: &mut JoystickController<P, B, E>,
    shutdown: &AtomicBool,
    mut on_cycle: F,
) -> Result<ControllerStats>
where
    P: Panel,
    B: ChipSelectBus,
    E: EnableLine,
    F: FnMut(&CycleReport),
{
    ctl.begin()?;
    let period = ctl.config().loop_period;
    let clock = ctl.clock().clone();
    tracing::info!(period_us = period.as_micros() as u64, "control loop start");

    while !shutdown.load(Ordering::Relaxed) {
        let report = ctl.step();
        if report.write_failures > 0 {
            tracing::debug!(failures = report.write_failures, "cycle had bus failures");
        }
        on_cycle(&report);
        let spent = clock.now().saturating_duration_since(report.now);
        clock.sleep(remaining(period, spent));
    }

    let stats = ctl.stats();
    tracing::info!(
        cycles = stats.cycles,
        ticks = stats.ticks_consumed,
        bus_errors = stats.bus_errors,
        "control loop stop"
    );
    ctl.shutdown()?;
    Ok(stats)
}

/// Run exactly `cycles` control cycles without initialization or shutdown.
///
/// Used by the simulator to interleave scripted input with the loop.
pub fn run_cycles<P, B, E, F>(
    ctl: &mut JoystickController<P, B, E>,
    cycles: u64,
    mut on_cycle: F,
) where
    P: Panel,
    B: ChipSelectBus,
    E: EnableLine,
    F: FnMut(&CycleReport),
{
    let period = ctl.config().loop_period;
    let clock = ctl.clock().clone();
    for _ in 0..cycles {
        let report = ctl.step();
        on_cycle(&report);
        let spent = clock.now().saturating_duration_since(report.now);
        clock.sleep(remaining(period, spent));
    }
}
