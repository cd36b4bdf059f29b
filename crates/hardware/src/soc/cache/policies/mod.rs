//! Victim selection for set-associative coherent caches.
//!
//! Every cache controller owns one boxed [`EvictionPolicy`] chosen from
//! [`ReplacementPolicy`](crate::config::ReplacementPolicy):
//!
//! - `Fifo`: First-In, First-Out.
//! - `Lru`: Least Recently Used.
//! - `Mru`: Most Recently Used.
//! - `Plru`: Pseudo-LRU (MRU bits).
//! - `Random`: xorshift selection.
//!
//! Policies only rank ways. Whether a way may actually be evicted (it is not
//! locked by an in-flight transaction) is decided by the controller.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Most Recently Used replacement policy.
pub mod mru;

/// Pseudo-LRU (MRU-bit) replacement policy.
pub mod plru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use plru::PlruPolicy;
pub use random::RandomPolicy;

use crate::config::ReplacementPolicy;

/// Strategy that tracks line usage and nominates eviction victims.
pub trait EvictionPolicy: std::fmt::Debug {
    /// Records an access (hit or fill) to `way` of `set`.
    fn update(&mut self, set: usize, way: usize);

    /// Nominates the way of `set` to evict next.
    fn get_victim(&mut self, set: usize) -> usize;
}

/// Builds the policy selected by `kind` for a cache of `sets` x `ways`.
pub fn build(kind: ReplacementPolicy, sets: usize, ways: usize) -> Box<dyn EvictionPolicy> {
    match kind {
        ReplacementPolicy::Lru => Box::new(LruPolicy::new(sets, ways)),
        ReplacementPolicy::Plru => Box::new(PlruPolicy::new(sets, ways)),
        ReplacementPolicy::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        ReplacementPolicy::Random => Box::new(RandomPolicy::new(sets, ways)),
        ReplacementPolicy::Mru => Box::new(MruPolicy::new(sets, ways)),
    }
}
