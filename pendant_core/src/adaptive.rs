//! Adaptive jog magnitude from hand-cranking speed.
//!
//! Click rate is 1 / (time since the previous tick), clamped to
//! `[min_click_hz, max_click_hz]` and mapped linearly onto
//! `[min_speed, max_speed]`. The first tick after an idle gap has no rate and
//! gets the minimum speed.

use std::time::Instant;

use crate::config::AdaptiveCfg;

/// Smoothing factor for the click-interval average (telemetry only).
const INTERVAL_EMA_ALPHA: f32 = 0.25;

/// What the estimator learned from one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickMeasurement {
    /// Unclamped click rate in clicks/s; `None` for the first tick after idle.
    pub rate_hz: Option<f32>,
    /// Adaptive magnitude, always within `[min_speed, max_speed]`.
    pub speed: u16,
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveSpeedEstimator {
    last_at: Option<Instant>,
    interval_ema_ms: Option<f32>,
    last_speed: Option<u16>,
}

impl AdaptiveSpeedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a tick captured at `at`.
    pub fn observe(&mut self, cfg: &AdaptiveCfg, at: Instant) -> ClickMeasurement {
        let elapsed = self.last_at.map(|prev| at.saturating_duration_since(prev));
        self.last_at = Some(at);

        let measurement = match elapsed {
            Some(dt) if dt <= cfg.idle_reset => {
                let dt_ms = dt.as_secs_f32() * 1000.0;
                self.interval_ema_ms = Some(match self.interval_ema_ms {
                    None => dt_ms,
                    Some(prev) => INTERVAL_EMA_ALPHA * dt_ms + (1.0 - INTERVAL_EMA_ALPHA) * prev,
                });
                let secs = dt.as_secs_f32();
                let rate = if secs > 0.0 { 1.0 / secs } else { f32::INFINITY };
                ClickMeasurement {
                    rate_hz: Some(rate),
                    speed: speed_for_rate(cfg, rate),
                }
            }
            _ => {
                self.interval_ema_ms = None;
                ClickMeasurement {
                    rate_hz: None,
                    speed: cfg.min_speed,
                }
            }
        };
        self.last_speed = Some(measurement.speed);
        tracing::trace!(
            rate_hz = measurement.rate_hz,
            speed = measurement.speed,
            "adaptive estimate"
        );
        measurement
    }

    /// Forget timing history; the next tick counts as the first after idle.
    pub fn reset(&mut self) {
        self.last_at = None;
        self.interval_ema_ms = None;
        self.last_speed = None;
    }

    pub fn last_speed(&self) -> Option<u16> {
        self.last_speed
    }

    /// Smoothed click interval in milliseconds, if ticks are flowing.
    pub fn interval_ema_ms(&self) -> Option<f32> {
        self.interval_ema_ms
    }
}

/// Map a click rate onto the adaptive speed range.
pub fn speed_for_rate(cfg: &AdaptiveCfg, rate_hz: f32) -> u16 {
    let lo_hz = cfg.min_click_hz;
    let hi_hz = cfg.max_click_hz.max(lo_hz);
    // max/min rather than clamp: NaN collapses to the low end instead of panicking
    let clamped = rate_hz.max(lo_hz).min(hi_hz);
    let span_hz = hi_hz - lo_hz;
    let ratio = if span_hz > 0.0 {
        (clamped - lo_hz) / span_hz
    } else {
        0.0
    };
    let lo = f32::from(cfg.min_speed);
    let hi = f32::from(cfg.max_speed.max(cfg.min_speed));
    let speed = (lo + ratio * (hi - lo)).round();
    (speed as u16).clamp(cfg.min_speed, cfg.max_speed.max(cfg.min_speed))
}
