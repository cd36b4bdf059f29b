//! Least Recently Used (LRU) Replacement Policy.
//!
//! Keeps a usage stack per set: index 0 is the most recently used way and the
//! last index is the victim.
//!
//! # Performance
//!
//! - `update()`: O(W) where W is the associativity
//! - `get_victim()`: O(1)
//! - Space: O(S × W)

use super::EvictionPolicy;

/// LRU Policy state.
#[derive(Debug)]
pub struct LruPolicy {
    /// Usage stacks, one per set.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates an LRU policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }
}

impl EvictionPolicy for LruPolicy {
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
            .and_then(|stack| stack.last())
            .copied()
            .unwrap_or(0)
    }
}
