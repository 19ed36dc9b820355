//! Bounded hand-off of encoder ticks from edge handlers to the control loop.
//!
//! Overflow drops the OLDEST queued tick: when the loop falls behind, the
//! most recent hand motion is what the operator expects to see. Every
//! displaced tick is counted.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::decoder::EncoderTick;

#[derive(Debug)]
pub struct TickQueue {
    inner: ArrayQueue<EncoderTick>,
    overflowed: AtomicU64,
}

impl TickQueue {
    /// Create a queue holding up to `capacity` ticks (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: ArrayQueue::new(capacity.max(1)),
            overflowed: AtomicU64::new(0),
        }
    }

    /// Non-blocking push; displaces the oldest tick when full.
    #[inline]
    pub fn push(&self, tick: EncoderTick) {
        if self.inner.force_push(tick).is_some() {
            self.overflowed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn pop(&self) -> Option<EncoderTick> {
        self.inner.pop()
    }

    /// Pop the ticks queued at the time of the call, oldest first.
    ///
    /// Bounded by the length observed on entry so a busy producer cannot
    /// keep the consumer looping.
    pub fn drain(&self) -> impl Iterator<Item = EncoderTick> + '_ {
        let pending = self.inner.len();
        std::iter::from_fn(move || self.inner.pop()).take(pending)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Ticks displaced by overflow since creation.
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Direction;
    use std::time::{Duration, Instant};

    fn tick(base: Instant, ms: u64) -> EncoderTick {
        EncoderTick {
            direction: Direction::Forward,
            at: base + Duration::from_millis(ms),
        }
    }

    #[test]
    fn preserves_fifo_order() {
        let q = TickQueue::new(4);
        let base = Instant::now();
        for ms in 0..3 {
            q.push(tick(base, ms));
        }
        let got: Vec<_> = q.drain().map(|t| t.at).collect();
        assert_eq!(got, vec![base, base + Duration::from_millis(1), base + Duration::from_millis(2)]);
        assert!(q.is_empty());
    }

    #[test]
    fn overflow_drops_oldest_and_counts() {
        let q = TickQueue::new(2);
        let base = Instant::now();
        for ms in 0..5 {
            q.push(tick(base, ms));
        }
        assert_eq!(q.len(), 2);
        assert_eq!(q.overflowed(), 3);
        let got: Vec<_> = q.drain().map(|t| t.at).collect();
        assert_eq!(got, vec![base + Duration::from_millis(3), base + Duration::from_millis(4)]);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let q = TickQueue::new(0);
        assert_eq!(q.capacity(), 1);
    }

    #[test]
    fn drain_is_bounded_by_entry_length() {
        let q = TickQueue::new(8);
        let base = Instant::now();
        q.push(tick(base, 0));
        let mut it = q.drain();
        assert!(it.next().is_some());
        q.push(tick(base, 1));
        assert!(it.next().is_none());
        drop(it);
        assert_eq!(q.len(), 1);
    }
}
