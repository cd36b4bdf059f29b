//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts ways of a set in round-robin order. The pointer only moves past a way
//! when that way is the one being (re)filled, so lines leave in the order they
//! arrived regardless of later hits.

use super::EvictionPolicy;

/// FIFO Policy state.
#[derive(Debug)]
pub struct FifoPolicy {
    /// Next way to evict, per set.
    next_way: Vec<usize>,
    ways: usize,
}

impl FifoPolicy {
    /// Creates a FIFO policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            next_way: vec![0; sets],
            ways: ways.max(1),
        }
    }
}

impl EvictionPolicy for FifoPolicy {
    fn update(&mut self, set: usize, way: usize) {
        if let Some(next) = self.next_way.get_mut(set) {
            if *next == way {
                *next = (*next + 1) % self.ways;
            }
        }
    }

    fn get_victim(&mut self, set: usize) -> usize {
        self.next_way.get(set).copied().unwrap_or(0)
    }
}
