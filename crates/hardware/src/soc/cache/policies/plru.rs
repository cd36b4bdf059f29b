//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! Approximates LRU with one MRU bit per way. An access sets the way's bit;
//! when every bit of the set would be set, all other bits are cleared. The
//! victim is the lowest way whose bit is clear.
//!
//! - `update()` and `get_victim()`: O(W) bit operations
//! - Space: one `u64` per set, so at most 64 ways

use super::EvictionPolicy;

/// PLRU Policy state.
#[derive(Debug)]
pub struct PlruPolicy {
    /// MRU bits per set.
    usage: Vec<u64>,
    ways: usize,
}

impl PlruPolicy {
    /// Creates a PLRU policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: vec![0; sets],
            ways: ways.clamp(1, 64),
        }
    }

    const fn all_ones(&self) -> u64 {
        if self.ways >= 64 {
            u64::MAX
        } else {
            (1u64 << self.ways) - 1
        }
    }
}

impl EvictionPolicy for PlruPolicy {
    fn update(&mut self, set: usize, way: usize) {
        let all_ones = self.all_ones();
        let Some(bits) = self.usage.get_mut(set) else {
            return;
        };
        let mask = 1u64 << (way % 64);
        *bits |= mask;
        if *bits & all_ones == all_ones {
            *bits = mask;
        }
    }

    fn get_victim(&mut self, set: usize) -> usize {
        let bits = self.usage.get(set).copied().unwrap_or(0);
        (0..self.ways).find(|i| (bits >> i) & 1 == 0).unwrap_or(0)
    }
}
