//! Continuations carried by the event queue.
//!
//! Nothing in the modeled hardware holds a callback. A component that must act
//! later schedules an [`Event`] value; the simulation loop pops due events and
//! routes them to the core or to the memory hierarchy.

use crate::common::{AccessType, Handle};
use crate::core::pipeline::rob::EntryRef;
use crate::core::units::fu::FuKind;
use crate::soc::coherence::message::{Message, NodeId};

/// Scheduled continuation.
#[derive(Debug, Clone)]
pub enum Event {
    /// Delivered to core `core`.
    Core {
        /// Receiving core.
        core: usize,
        /// Payload.
        event: CoreEvent,
    },
    /// Delivered to the memory hierarchy.
    Memory(MemoryEvent),
}

/// Continuation handled by a core.
#[derive(Debug, Clone, Copy)]
pub enum CoreEvent {
    /// A functional unit finished its issue latency and may accept work again.
    FuReleased {
        /// Unit class.
        kind: FuKind,
        /// Pool epoch at acquisition; stale after a squash released every unit.
        epoch: u64,
    },
    /// The operation of a ROB or LSQ entry finished executing.
    OperationComplete {
        /// Thread index within the core.
        thread: usize,
        /// Completed entry.
        entry: EntryRef,
    },
    /// A memory access submitted to the hierarchy completed.
    AccessComplete(AccessToken),
}

/// Who is waiting for a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessToken {
    /// Core that submitted the access.
    pub core: usize,
    /// Thread index within the core.
    pub thread: usize,
    /// What completes.
    pub target: AccessTarget,
}

/// The pipeline structure an access completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    /// The thread's outstanding instruction fetch.
    Ifetch,
    /// A load or store queue entry.
    Lsq(Handle),
    /// A cache warm-up access; nothing waits for it.
    Warmup,
}

/// Continuation handled by the memory hierarchy.
#[derive(Debug, Clone, Copy)]
pub enum MemoryEvent {
    /// An L1 controller services an access after its hit latency, or replays
    /// one that was parked on a locked line.
    L1Access {
        /// L1 controller id.
        l1: usize,
        /// Access type.
        kind: AccessType,
        /// Line-aligned address.
        tag: u64,
    },
    /// A coherence message arrives.
    Deliver {
        /// Receiving node.
        to: NodeId,
        /// The message.
        message: Message,
    },
    /// Main memory returns a line to the directory.
    MemoryData {
        /// Line-aligned address.
        tag: u64,
    },
}
