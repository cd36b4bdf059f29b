//! Discrete-event clock.
//!
//! The event queue owns the simulation cycle counter and a priority queue of
//! scheduled continuations. Events scheduled for the same cycle are returned in
//! the order they were scheduled, so a run is fully deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Scheduled<E> {
    cycle: u64,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cycle == other.cycle && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    // Reversed so the max-heap pops the earliest (cycle, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cycle
            .cmp(&self.cycle)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cycle counter plus the queue of pending events.
#[derive(Debug)]
pub struct EventQueue<E> {
    cycle: u64,
    seq: u64,
    heap: BinaryHeap<Scheduled<E>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue at cycle 0.
    pub fn new() -> Self {
        Self {
            cycle: 0,
            seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current simulation cycle.
    #[inline]
    pub const fn current_cycle(&self) -> u64 {
        self.cycle
    }

    /// Schedules `event` to run `delay` cycles from now.
    ///
    /// A zero delay runs the event during the current cycle's drain.
    pub fn schedule(&mut self, event: E, delay: u64) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Scheduled {
            cycle: self.cycle + delay,
            seq,
            event,
        });
    }

    /// Pops the next event due at or before the current cycle.
    pub fn pop_due(&mut self) -> Option<E> {
        if self.heap.peek()?.cycle <= self.cycle {
            self.heap.pop().map(|s| s.event)
        } else {
            None
        }
    }

    /// Moves the clock forward by one cycle.
    pub const fn advance(&mut self) {
        self.cycle += 1;
    }

    /// Cycle of the earliest pending event.
    pub fn next_event_cycle(&self) -> Option<u64> {
        self.heap.peek().map(|s| s.cycle)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
