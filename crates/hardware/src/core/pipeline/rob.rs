//! Reorder buffer and load/store queue entries.
//!
//! Both structures are per-thread program-ordered queues over an [`Arena`]:
//! 1. **Allocation:** Rename pushes an entry at the tail and receives a [`Handle`].
//! 2. **Lookup:** Issue queues, dependents lists and pending events hold
//!    [`EntryRef`]s; a handle whose entry was committed or squashed no longer
//!    resolves.
//! 3. **In-order Retirement:** Commit pops from the head.
//! 4. **Squash:** Entries are popped from the tail back to the head.
//!
//! A load or store occupies one ROB entry (the effective-address computation,
//! tagged [`RobKind::Load`] / [`RobKind::Store`]) and one linked LSQ entry (the
//! memory access). The LSQ entry, not the ROB entry, writes back load targets.

use std::collections::VecDeque;

use crate::common::{Arena, Handle};
use crate::core::pipeline::regfile::PhysRegId;
use crate::core::units::bru::PredictorUpdate;
use crate::isa::{ArchReg, DynamicInstruction};

/// Reference to a ROB or LSQ entry of some thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryRef {
    /// Reorder buffer entry.
    Rob(Handle),
    /// Load/store queue entry.
    Lsq(Handle),
}

/// Role of a ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobKind {
    /// Computes a value or resolves control flow.
    #[default]
    Plain,
    /// Effective-address computation of a load.
    Load,
    /// Effective-address computation of a store.
    Store,
}

impl RobKind {
    /// Returns true for effective-address computations.
    #[inline]
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Load | Self::Store)
    }
}

/// One renamed destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    /// Architectural register.
    pub arch: ArchReg,
    /// Register allocated by this instruction.
    pub new: PhysRegId,
    /// Register the rename table held before.
    pub old: PhysRegId,
}

/// Progress flags shared by ROB and LSQ entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryStatus {
    /// Placed in an issue queue.
    pub dispatched: bool,
    /// Sent to a functional unit or the memory hierarchy.
    pub issued: bool,
    /// Result available.
    pub completed: bool,
    /// Removed by a squash.
    pub squashed: bool,
}

/// Reorder buffer entry.
#[derive(Clone, Debug)]
pub struct RobEntry {
    /// The instruction.
    pub inst: DynamicInstruction,
    /// Plain, or effective-address computation of a load/store.
    pub kind: RobKind,
    /// Next pc actually executed.
    pub npc: u32,
    /// Next pc fetch followed.
    pub predicted_npc: u32,
    /// Return address stack top to restore if this entry heads a squash.
    pub ras_checkpoint: usize,
    /// Predictor state to train at commit.
    pub predictor_update: PredictorUpdate,
    /// Fetched on a mispredicted path.
    pub speculative: bool,
    /// Physical source registers.
    pub sources: Vec<PhysRegId>,
    /// Renamed destinations.
    pub targets: Vec<Mapping>,
    /// Sources not yet produced.
    pub not_ready_operands: usize,
    /// The address base of a load/store is produced.
    pub ea_operand_ready: bool,
    /// Linked LSQ entry of a load/store.
    pub lsq: Option<Handle>,
    /// Progress flags.
    pub status: EntryStatus,
}

impl RobEntry {
    /// Returns true if the entry may issue. Effective-address computations wait
    /// only for their address base.
    #[inline]
    pub const fn all_operands_ready(&self) -> bool {
        if self.kind.is_memory() {
            self.ea_operand_ready
        } else {
            self.not_ready_operands == 0
        }
    }

    /// Returns true for control instructions.
    #[inline]
    pub const fn is_control(&self) -> bool {
        self.inst.inst.mnemonic.is_control()
    }
}

/// Load/store queue entry.
#[derive(Clone, Debug)]
pub struct LsqEntry {
    /// Id of the dynamic instruction.
    pub inst_id: u64,
    /// Program counter.
    pub pc: u32,
    /// Effective address computed at fetch.
    pub ea: u32,
    /// Store (otherwise load).
    pub is_store: bool,
    /// The address base register is produced.
    pub store_address_ready: bool,
    /// Cycle at which `store_address_ready` was set.
    pub address_ready_cycle: Option<u64>,
    /// Physical source registers, shared with the ROB entry.
    pub sources: Vec<PhysRegId>,
    /// Load destinations written back when the access completes.
    pub targets: Vec<PhysRegId>,
    /// Sources not yet produced.
    pub not_ready_operands: usize,
    /// Progress flags.
    pub status: EntryStatus,
    /// A memory access for this entry is outstanding.
    pub in_flight: bool,
}

impl LsqEntry {
    /// Returns true if every source is produced.
    #[inline]
    pub const fn all_operands_ready(&self) -> bool {
        self.not_ready_operands == 0
    }

    /// Marks the address base produced at `cycle`.
    pub const fn set_store_address_ready(&mut self, cycle: u64) {
        if !self.store_address_ready {
            self.store_address_ready = true;
            self.address_ready_cycle = Some(cycle);
        }
    }

    /// Returns true if the address counts as resolved at `cycle`: known since
    /// an earlier cycle.
    pub fn address_resolved_at(&self, cycle: u64) -> bool {
        self.address_ready_cycle.is_some_and(|c| c < cycle)
    }
}

/// Bounded program-ordered queue of arena entries.
#[derive(Clone, Debug)]
pub struct EntryQueue<T> {
    arena: Arena<T>,
    order: VecDeque<Handle>,
    capacity: usize,
}

/// Per-thread reorder buffer.
pub type ReorderBuffer = EntryQueue<RobEntry>;

/// Per-thread load/store queue.
pub type LoadStoreQueue = EntryQueue<LsqEntry>;

impl<T> EntryQueue<T> {
    /// Creates an empty queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no entry is present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if no entry can be added.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    /// Appends `value` at the tail, or returns `None` when full.
    pub fn push(&mut self, id: u64, value: T) -> Option<Handle> {
        if self.is_full() {
            return None;
        }
        let handle = self.arena.insert(id, value);
        self.order.push_back(handle);
        Some(handle)
    }

    /// Handle of the oldest entry.
    pub fn head(&self) -> Option<Handle> {
        self.order.front().copied()
    }

    /// Removes and returns the oldest entry.
    pub fn pop_head(&mut self) -> Option<(Handle, T)> {
        let handle = self.order.pop_front()?;
        self.arena.remove(handle).map(|v| (handle, v))
    }

    /// Removes and returns the youngest entry.
    pub fn pop_tail(&mut self) -> Option<(Handle, T)> {
        let handle = self.order.pop_back()?;
        self.arena.remove(handle).map(|v| (handle, v))
    }

    /// Removes the entry for `handle` wherever it sits.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let pos = self.order.iter().position(|&h| h == handle)?;
        let _ = self.order.remove(pos);
        self.arena.remove(handle)
    }

    /// Entry for `handle`, or `None` if it left the queue.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.arena.get(handle)
    }

    /// Mutable variant of [`EntryQueue::get`].
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.arena.get_mut(handle)
    }

    /// Handles from oldest to youngest.
    pub fn handles(&self) -> impl DoubleEndedIterator<Item = Handle> + '_ {
        self.order.iter().copied()
    }

    /// Entries from oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.order
            .iter()
            .filter_map(|&h| self.arena.get(h).map(|e| (h, e)))
    }
}
