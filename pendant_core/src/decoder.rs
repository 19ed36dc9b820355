//! Quadrature decoding of the jogwheel's A/B phase lines.
//!
//! Line state is packed as `A << 1 | B`. The lookup table is indexed by
//! `prev << 2 | next` and yields +1, -1, or 0 for "no movement or invalid".
//! A leading B (00 -> 10 -> 11 -> 01) is forward.
//!
//! Everything in here is safe to call from an edge-interrupt context: no
//! allocation, no blocking, constant time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Instant;

use pendant_traits::Clock;

use crate::queue::TickQueue;

const QUAD_TABLE: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// One detected step of the jogwheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderTick {
    pub direction: Direction,
    /// Capture time of the edge that completed the step.
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Lines unchanged.
    Idle,
    Step(Direction),
    /// Both lines changed at once: bounce or a missed edge.
    Invalid,
}

#[inline]
pub fn line_state(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | (b as u8)
}

#[inline]
pub fn classify(prev: u8, next: u8) -> Transition {
    let prev = prev & 0b11;
    let next = next & 0b11;
    if prev == next {
        return Transition::Idle;
    }
    match QUAD_TABLE[((prev << 2) | next) as usize] {
        1 => Transition::Step(Direction::Forward),
        -1 => Transition::Step(Direction::Reverse),
        _ => Transition::Invalid,
    }
}

/// Single-owner decoder, for polled inputs and tests.
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    last: u8,
    invalid: u64,
}

impl QuadratureDecoder {
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            last: line_state(a, b),
            invalid: 0,
        }
    }

    /// Feed the current line levels; returns a tick when they complete a valid step.
    pub fn edge(&mut self, a: bool, b: bool, at: Instant) -> Option<EncoderTick> {
        let next = line_state(a, b);
        let t = classify(self.last, next);
        self.last = next;
        match t {
            Transition::Step(direction) => Some(EncoderTick { direction, at }),
            Transition::Invalid => {
                self.invalid = self.invalid.saturating_add(1);
                None
            }
            Transition::Idle => None,
        }
    }

    pub fn invalid_transitions(&self) -> u64 {
        self.invalid
    }
}

/// Decoder shared between edge-interrupt handlers.
///
/// On Linux each watched line gets its own interrupt thread, so the last
/// state is swapped atomically and decoded ticks go straight into the
/// bounded [`TickQueue`].
pub struct EdgeDecoder<C> {
    last: AtomicU8,
    invalid: AtomicU64,
    queue: Arc<TickQueue>,
    clock: C,
}

impl<C: Clock + Send + Sync> EdgeDecoder<C> {
    pub fn new(a: bool, b: bool, queue: Arc<TickQueue>, clock: C) -> Self {
        Self {
            last: AtomicU8::new(line_state(a, b)),
            invalid: AtomicU64::new(0),
            queue,
            clock,
        }
    }

    /// Edge handler body: capture time, decode, enqueue.
    pub fn on_levels(&self, a: bool, b: bool) {
        let at = self.clock.now();
        let next = line_state(a, b);
        let prev = self.last.swap(next, Ordering::AcqRel);
        match classify(prev, next) {
            Transition::Step(direction) => self.queue.push(EncoderTick { direction, at }),
            Transition::Invalid => {
                self.invalid.fetch_add(1, Ordering::Relaxed);
            }
            Transition::Idle => {}
        }
    }

    pub fn invalid_transitions(&self) -> u64 {
        self.invalid.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pendant_traits::ManualClock;

    // A leads B
    const FORWARD: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

    #[test]
    fn gray_code_forward_and_reverse() {
        let now = Instant::now();
        let mut d = QuadratureDecoder::new(false, false);
        for (a, b) in FORWARD {
            let t = d.edge(a, b, now).expect("tick");
            assert_eq!(t.direction, Direction::Forward);
        }
        for (a, b) in FORWARD.iter().rev().skip(1).chain([(false, false)].iter()) {
            let t = d.edge(*a, *b, now).expect("tick");
            assert_eq!(t.direction, Direction::Reverse);
        }
    }

    #[test]
    fn every_double_bit_change_is_invalid() {
        for prev in 0u8..4 {
            let next = prev ^ 0b11;
            assert_eq!(classify(prev, next), Transition::Invalid);
        }
    }

    #[test]
    fn every_single_bit_change_is_a_step() {
        for prev in 0u8..4 {
            for flip in [0b01u8, 0b10] {
                assert!(matches!(classify(prev, prev ^ flip), Transition::Step(_)));
            }
        }
    }

    #[test]
    fn invalid_edge_emits_nothing_and_counts() {
        let mut d = QuadratureDecoder::new(false, false);
        assert!(d.edge(true, true, Instant::now()).is_none());
        assert_eq!(d.invalid_transitions(), 1);
        assert!(d.edge(true, true, Instant::now()).is_none());
        assert_eq!(d.invalid_transitions(), 1);
    }

    #[test]
    fn edge_decoder_enqueues_with_capture_time() {
        let clock = ManualClock::new();
        let queue = Arc::new(TickQueue::new(8));
        let dec = EdgeDecoder::new(false, false, queue.clone(), clock.clone());
        clock.advance_ms(3);
        dec.on_levels(true, false);
        dec.on_levels(false, true); // double-bit change
        let tick = queue.pop().expect("one tick");
        assert_eq!(tick.direction, Direction::Forward);
        assert_eq!(tick.at, clock.now());
        assert!(queue.pop().is_none());
        assert_eq!(dec.invalid_transitions(), 1);
    }
}
