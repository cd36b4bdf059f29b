//! Most Recently Used (MRU) Replacement Policy.
//!
//! Evicts the way touched last. Useful for cyclic scans over a working set
//! larger than the cache, where the newest line is the one needed furthest in
//! the future.

use super::EvictionPolicy;

/// MRU Policy state.
#[derive(Debug)]
pub struct MruPolicy {
    /// Usage stacks, one per set; index 0 is the victim.
    usage: Vec<Vec<usize>>,
}

impl MruPolicy {
    /// Creates an MRU policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }
}

impl EvictionPolicy for MruPolicy {
    fn update(&mut self, set: usize, way: usize) {
        let Some(stack) = self.usage.get_mut(set) else {
            return;
        };
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    fn get_victim(&mut self, set: usize) -> usize {
        self.usage
            .get(set)
            .and_then(|stack| stack.first())
            .copied()
            .unwrap_or(0)
    }
}
