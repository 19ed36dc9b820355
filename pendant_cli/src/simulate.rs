//! `simulate`: turn the jogwheel against simulated hardware on virtual time.
//!
//! The crank goes through the same edge decoder the interrupt handlers use,
//! one Gray-code step per click, and every completed bus frame is printed.

use std::time::{Duration, Instant};

use pendant_core::{Axis, ControllerStats, PendantConfig, build_pendant, runner};
use pendant_hardware::{BusFrame, RecordingBus, SimulatedEnableLine, SimulatedPanel};
use pendant_traits::{Clock, ManualClock, PanelLevels};
use serde_json::json;

use crate::cli::SimSpeed;

#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub axis: Axis,
    pub speed: SimSpeed,
    pub ticks: u32,
    pub rate_hz: f32,
    pub reverse: bool,
}

/// Jogwheel line levels (A, B) at a Gray-code position; A leads B going forward.
fn lines(pos: i64) -> (bool, bool) {
    match pos.rem_euclid(4) {
        0 => (false, false),
        1 => (true, false),
        2 => (true, true),
        _ => (false, true),
    }
}

fn emit(frames: Vec<BusFrame>, t: Duration, json: bool) {
    for frame in frames {
        let axis = Axis::ALL.get(frame.device).map_or("?", |a| a.name());
        let code = frame.code();
        if json {
            println!(
                "{}",
                json!({
                    "t_ms": t.as_secs_f64() * 1000.0,
                    "axis": axis,
                    "code": code,
                    "bytes": frame.bytes,
                })
            );
        } else {
            let bytes: Vec<String> = frame.bytes.iter().map(|b| format!("{b:02x}")).collect();
            println!(
                "t={:>9.3}ms  {axis}  code={:<4} [{}]",
                t.as_secs_f64() * 1000.0,
                code.map_or_else(|| "-".to_string(), |c| c.to_string()),
                bytes.join(" ")
            );
        }
    }
}

/// Run the scripted crank, then let every pulse expire and shut down.
pub fn run(cfg: PendantConfig, script: Script, json: bool) -> eyre::Result<ControllerStats> {
    if !(script.rate_hz.is_finite() && script.rate_hz > 0.0) {
        eyre::bail!("--rate-hz must be a positive number");
    }
    let period = cfg.loop_period;
    if period.is_zero() {
        eyre::bail!("simulate needs runner.loop_period_us > 0");
    }
    let settle = cfg
        .axes
        .0
        .iter()
        .map(|a| a.click_pulse.max(a.jog_pulse))
        .max()
        .unwrap_or_default();

    let clock = ManualClock::new();
    let origin: Instant = clock.now();
    let since = |at: Instant| at.saturating_duration_since(origin);

    let panel = SimulatedPanel::new(PanelLevels::default());
    panel.select_axis(Some(script.axis.index()));
    panel.select_speed(Some(script.speed.detent_index()));
    panel.set_adaptive(script.speed == SimSpeed::Adaptive);
    let bus = RecordingBus::new();

    let mut ctl = build_pendant(
        panel,
        bus.clone(),
        SimulatedEnableLine::new(),
        cfg,
        Some(Box::new(clock.clone())),
    )?;
    ctl.begin()?;
    emit(bus.take_frames(), Duration::ZERO, json);

    let decoder = ctl.attach_decoder(false, false);
    let interval = Duration::from_secs_f64(1.0 / f64::from(script.rate_hz));
    let cycles_per_tick = (interval.as_nanos() / period.as_nanos()).max(1) as u64;
    let settle_cycles = (settle.as_nanos() / period.as_nanos()) as u64 + 2;
    let step = if script.reverse { -1 } else { 1 };
    tracing::info!(
        axis = %script.axis,
        speed = ?script.speed,
        ticks = script.ticks,
        rate_hz = script.rate_hz,
        "simulation start"
    );

    let mut on_cycle = |r: &pendant_core::CycleReport| emit(bus.take_frames(), since(r.now), json);
    let mut pos = 0i64;
    for _ in 0..script.ticks {
        pos += step;
        let (a, b) = lines(pos);
        decoder.on_levels(a, b);
        runner::run_cycles(&mut ctl, cycles_per_tick, &mut on_cycle);
    }
    runner::run_cycles(&mut ctl, settle_cycles, &mut on_cycle);

    let stats = ctl.stats();
    ctl.shutdown()?;
    emit(bus.take_frames(), since(clock.now()), json);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_walk_gray_code() {
        let walk: Vec<_> = (0..5).map(lines).collect();
        assert_eq!(
            walk,
            vec![
                (false, false),
                (true, false),
                (true, true),
                (false, true),
                (false, false)
            ]
        );
        assert_eq!(lines(-1), (false, true));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let script = Script {
            axis: Axis::X,
            speed: SimSpeed::X1,
            ticks: 1,
            rate_hz: 0.0,
            reverse: false,
        };
        assert!(run(PendantConfig::default(), script, false).is_err());
    }
}
