//! Random Replacement Policy.
//!
//! Picks a victim with a xorshift generator. The seed is fixed so runs are
//! reproducible.

use super::EvictionPolicy;

const SEED: u64 = 123_456_789;

/// Random Policy state.
#[derive(Debug)]
pub struct RandomPolicy {
    ways: usize,
    state: u64,
}

impl RandomPolicy {
    /// Creates a random policy; the set count does not affect it.
    pub fn new(_sets: usize, ways: usize) -> Self {
        Self {
            ways: ways.max(1),
            state: SEED,
        }
    }
}

impl EvictionPolicy for RandomPolicy {
    fn update(&mut self, _set: usize, _way: usize) {}

    fn get_victim(&mut self, _set: usize) -> usize {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x % self.ways as u64) as usize
    }
}
