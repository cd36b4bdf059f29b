//! Simulation driver, event clock and continuations.
//!
//! 1. **Event Queue:** The discrete-event clock shared by every component.
//! 2. **Events:** Continuations routed to cores or to the memory hierarchy.
//! 3. **Simulation:** Owns the cores, the hierarchy and the clock, and runs the
//!    fast-forward, warm-up and measurement phases.

/// Continuation values.
pub mod event;

/// Cycle-keyed priority queue.
pub mod event_queue;

/// Top-level simulation.
pub mod simulation;

pub use event::{AccessTarget, AccessToken, CoreEvent, Event, MemoryEvent};
pub use event_queue::EventQueue;
pub use simulation::{Phase, Simulation};

use crate::common::IdCounter;
use crate::soc::MemoryHierarchy;

/// Mutable simulation state a core needs during its cycle.
#[derive(Debug)]
pub struct SimContext<'a> {
    /// The clock and pending continuations.
    pub events: &'a mut EventQueue<Event>,
    /// Caches, directory and network.
    pub memory: &'a mut MemoryHierarchy,
    /// Id source for dynamic instructions and pipeline entries.
    pub ids: &'a mut IdCounter,
}

impl SimContext<'_> {
    /// Current cycle.
    #[inline]
    pub const fn cycle(&self) -> u64 {
        self.events.current_cycle()
    }
}
