//! Timed joystick deflections.
//!
//! A pulse deflects one axis by `offset` steps from center until it expires.
//! At most one pulse is live per axis. A same-direction tick refreshes the
//! running pulse (new magnitude, new start, no stacking); an opposite tick
//! replaces it outright.

use std::time::{Duration, Instant};

use crate::axis::{Axis, AxisMap};
use crate::config::PulseCfg;
use crate::decoder::Direction;
use crate::speed::Detent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseWidth {
    /// Single deliberate detent click.
    Click,
    /// Continuous cranking.
    Jog,
}

impl PulseWidth {
    /// Pick the width class for a tick.
    ///
    /// `rate_hz` is the unclamped click rate; `None` (first tick after idle)
    /// is always a click.
    pub fn classify(cfg: &PulseCfg, detent: Option<Detent>, rate_hz: Option<f32>) -> Self {
        if cfg.x1_click_only && detent == Some(Detent::X1) {
            return PulseWidth::Click;
        }
        match rate_hz {
            Some(r) if r >= cfg.jog_threshold_hz => PulseWidth::Jog,
            _ => PulseWidth::Click,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PulseWidth::Click => "click",
            PulseWidth::Jog => "jog",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub axis: Axis,
    /// Signed deflection from center in potentiometer steps.
    pub offset: i32,
    pub started: Instant,
    pub duration: Duration,
}

impl Pulse {
    #[inline]
    pub fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        if self.offset < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseUpdate {
    Started,
    Extended,
    Replaced,
}

#[derive(Debug, Clone, Default)]
pub struct PulseGenerator {
    slots: AxisMap<Option<Pulse>>,
}

impl PulseGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or refresh the pulse on `axis`.
    pub fn apply(
        &mut self,
        axis: Axis,
        direction: Direction,
        magnitude: u16,
        duration: Duration,
        now: Instant,
    ) -> PulseUpdate {
        let pulse = Pulse {
            axis,
            offset: direction.sign() * i32::from(magnitude),
            started: now,
            duration,
        };
        let slot = &mut self.slots[axis];
        let update = match slot {
            None => PulseUpdate::Started,
            Some(live) if live.expired(now) => PulseUpdate::Started,
            Some(live) if live.direction() == direction => PulseUpdate::Extended,
            Some(_) => PulseUpdate::Replaced,
        };
        *slot = Some(pulse);
        update
    }

    /// Drop pulses that have run their course; returns the axes that ended.
    pub fn expire(&mut self, now: Instant) -> AxisMap<bool> {
        let mut ended = AxisMap([false; 3]);
        for (axis, slot) in self.slots.iter_mut() {
            if slot.is_some_and(|p| p.expired(now)) {
                *slot = None;
                ended[axis] = true;
            }
        }
        ended
    }

    /// Current deflection on `axis`, zero when idle.
    #[inline]
    pub fn offset(&self, axis: Axis) -> i32 {
        self.slots[axis].map_or(0, |p| p.offset)
    }

    pub fn active(&self, axis: Axis) -> Option<&Pulse> {
        self.slots[axis].as_ref()
    }

    pub fn any_active(&self) -> bool {
        self.slots.0.iter().any(Option::is_some)
    }

    pub fn clear(&mut self) {
        self.slots = AxisMap::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn pulse_expires_at_duration() {
        let t0 = Instant::now();
        let mut g = PulseGenerator::new();
        g.apply(Axis::X, Direction::Forward, 5, ms(100), t0);
        assert_eq!(g.offset(Axis::X), 5);
        assert_eq!(g.expire(t0 + ms(99)), AxisMap([false; 3]));
        assert_eq!(g.offset(Axis::X), 5);
        assert_eq!(g.expire(t0 + ms(100)), AxisMap([true, false, false]));
        assert_eq!(g.offset(Axis::X), 0);
    }

    #[test]
    fn same_direction_refreshes_without_stacking() {
        let t0 = Instant::now();
        let mut g = PulseGenerator::new();
        assert_eq!(g.apply(Axis::Y, Direction::Forward, 5, ms(100), t0), PulseUpdate::Started);
        let up = g.apply(Axis::Y, Direction::Forward, 10, ms(10), t0 + ms(50));
        assert_eq!(up, PulseUpdate::Extended);
        assert_eq!(g.offset(Axis::Y), 10);
        let p = g.active(Axis::Y).copied().expect("live");
        assert_eq!(p.started, t0 + ms(50));
        assert_eq!(p.duration, ms(10));
    }

    #[test]
    fn opposite_direction_replaces() {
        let t0 = Instant::now();
        let mut g = PulseGenerator::new();
        g.apply(Axis::Z, Direction::Forward, 5, ms(100), t0);
        let up = g.apply(Axis::Z, Direction::Reverse, 5, ms(100), t0 + ms(1));
        assert_eq!(up, PulseUpdate::Replaced);
        assert_eq!(g.offset(Axis::Z), -5);
    }

    #[test]
    fn axes_are_independent() {
        let t0 = Instant::now();
        let mut g = PulseGenerator::new();
        g.apply(Axis::X, Direction::Forward, 5, ms(100), t0);
        g.apply(Axis::Z, Direction::Reverse, 20, ms(10), t0);
        assert_eq!(g.offset(Axis::Y), 0);
        g.expire(t0 + ms(10));
        assert_eq!(g.offset(Axis::X), 5);
        assert_eq!(g.offset(Axis::Z), 0);
        g.clear();
        assert!(!g.any_active());
    }

    #[test]
    fn width_classification() {
        let cfg = PulseCfg::default();
        assert_eq!(PulseWidth::classify(&cfg, Some(Detent::X10), None), PulseWidth::Click);
        assert_eq!(PulseWidth::classify(&cfg, Some(Detent::X10), Some(0.5)), PulseWidth::Click);
        assert_eq!(PulseWidth::classify(&cfg, Some(Detent::X10), Some(1.0)), PulseWidth::Jog);
        assert_eq!(PulseWidth::classify(&cfg, Some(Detent::X100), Some(10.0)), PulseWidth::Jog);
        assert_eq!(PulseWidth::classify(&cfg, Some(Detent::X1), Some(500.0)), PulseWidth::Click);
        let loose = PulseCfg {
            x1_click_only: false,
            ..cfg
        };
        assert_eq!(PulseWidth::classify(&loose, Some(Detent::X1), Some(500.0)), PulseWidth::Jog);
    }
}
