//! Physical register files.
//!
//! Every core renames into one physical file per dependency class (integer,
//! floating point, miscellaneous). A physical register moves through:
//!
//! ```text
//! Available --allocate--> Allocated --writeback--> Ready --commit--> Committed
//!     ^                       |                      |                   |
//!     +--------recover--------+----------------------+                   |
//!     +-------------------------------reclaim----------------------------+
//! ```
//!
//! Writeback wakes three kinds of waiters: entries counting not-ready operands,
//! LSQ entries waiting for a store address base, and ROB entries waiting for the
//! effective-address base.

use std::collections::VecDeque;

use crate::common::{Handle, SimError, SimResult};
use crate::core::pipeline::rob::EntryRef;
use crate::isa::{ArchReg, RegClass};

/// Names one physical register of a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysRegId {
    /// File the register belongs to.
    pub class: RegClass,
    /// Slot inside the file.
    pub index: usize,
}

/// Lifecycle state of a physical register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PhysRegState {
    /// Free for allocation.
    #[default]
    Available,
    /// Renamed as an instruction target; value not produced yet.
    Allocated,
    /// Value produced; the producer has not committed.
    Ready,
    /// Holds the architectural value of its register.
    Committed,
}

impl PhysRegState {
    /// Returns true if consumers can read the value.
    #[inline]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::Committed)
    }
}

#[derive(Clone, Debug, Default)]
struct PhysReg {
    state: PhysRegState,
    arch: Option<ArchReg>,
    operand_dependents: Vec<EntryRef>,
    store_address_dependents: Vec<Handle>,
    ea_dependents: Vec<Handle>,
}

/// Move applied to a register once its producer leaves the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegOp {
    /// Ready → Committed.
    Commit,
    /// Allocated or Ready → Available.
    Recover,
    /// Committed → Available.
    Reclaim,
}

/// Waiters released by a writeback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wakeup {
    /// ROB and LSQ entries with one fewer not-ready operand.
    pub operands: Vec<EntryRef>,
    /// LSQ entries whose store address base is now known.
    pub store_addresses: Vec<Handle>,
    /// ROB entries whose effective-address base is now known.
    pub ea_operands: Vec<Handle>,
}

/// One physical register file.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    class: RegClass,
    regs: Vec<PhysReg>,
    free: VecDeque<usize>,
}

impl RegisterFile {
    /// Creates a file of `capacity` available registers.
    pub fn new(class: RegClass, capacity: usize) -> Self {
        let mut regs = Vec::with_capacity(capacity);
        regs.resize_with(capacity, PhysReg::default);
        Self {
            class,
            regs,
            free: (0..capacity).collect(),
        }
    }

    /// Dependency class of this file.
    #[inline]
    pub const fn class(&self) -> RegClass {
        self.class
    }

    /// Total registers.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.regs.len()
    }

    /// Registers in the Available state.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Registers in any state but Available.
    pub fn in_use(&self) -> usize {
        self.regs
            .iter()
            .filter(|r| r.state != PhysRegState::Available)
            .count()
    }

    /// Returns true if the free count matches the register states.
    pub fn is_consistent(&self) -> bool {
        self.free_count() + self.in_use() == self.capacity()
    }

    /// State of register `index`.
    pub fn state(&self, index: usize) -> Option<PhysRegState> {
        self.regs.get(index).map(|r| r.state)
    }

    /// Architectural register `index` is bound to, if any.
    pub fn arch_of(&self, index: usize) -> Option<ArchReg> {
        self.regs.get(index).and_then(|r| r.arch)
    }

    /// Returns true if register `index` holds a produced value.
    pub fn is_ready(&self, index: usize) -> bool {
        self.state(index).is_some_and(PhysRegState::is_ready)
    }

    /// Binds a free register to `arch` directly in the Committed state.
    ///
    /// Used once per architectural register when a thread's rename table is built.
    pub fn reserve(&mut self, arch: ArchReg) -> Option<PhysRegId> {
        self.take(arch, PhysRegState::Committed)
    }

    /// Allocates a free register as the new target of `arch`.
    pub fn allocate(&mut self, arch: ArchReg) -> Option<PhysRegId> {
        self.take(arch, PhysRegState::Allocated)
    }

    fn take(&mut self, arch: ArchReg, state: PhysRegState) -> Option<PhysRegId> {
        let index = self.free.pop_front()?;
        let reg = &mut self.regs[index];
        reg.state = state;
        reg.arch = Some(arch);
        Some(PhysRegId {
            class: self.class,
            index,
        })
    }

    /// Allocated → Ready. Returns the released waiters, or `None` if the register
    /// was not Allocated.
    pub fn writeback(&mut self, index: usize) -> Option<Wakeup> {
        let reg = self.regs.get_mut(index)?;
        if reg.state != PhysRegState::Allocated {
            return None;
        }
        reg.state = PhysRegState::Ready;
        Some(Wakeup {
            operands: std::mem::take(&mut reg.operand_dependents),
            store_addresses: std::mem::take(&mut reg.store_address_dependents),
            ea_operands: std::mem::take(&mut reg.ea_dependents),
        })
    }

    /// Ready → Committed.
    pub fn commit(&mut self, index: usize) -> bool {
        match self.regs.get_mut(index) {
            Some(reg) if reg.state == PhysRegState::Ready => {
                reg.state = PhysRegState::Committed;
                true
            }
            _ => false,
        }
    }

    /// Allocated or Ready → Available, dropping any waiters.
    pub fn recover(&mut self, index: usize) -> bool {
        match self.regs.get(index).map(|r| r.state) {
            Some(PhysRegState::Allocated | PhysRegState::Ready) => {
                self.release(index);
                true
            }
            _ => false,
        }
    }

    /// Committed → Available.
    pub fn reclaim(&mut self, index: usize) -> bool {
        match self.regs.get(index).map(|r| r.state) {
            Some(PhysRegState::Committed) => {
                self.release(index);
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, index: usize) {
        self.regs[index] = PhysReg::default();
        self.free.push_back(index);
    }

    /// Registers `entry` to be woken when register `index` is written back.
    pub fn add_operand_dependent(&mut self, index: usize, entry: EntryRef) {
        if let Some(reg) = self.regs.get_mut(index) {
            reg.operand_dependents.push(entry);
        }
    }

    /// Registers an LSQ entry waiting for its store address base.
    pub fn add_store_address_dependent(&mut self, index: usize, lsq: Handle) {
        if let Some(reg) = self.regs.get_mut(index) {
            reg.store_address_dependents.push(lsq);
        }
    }

    /// Registers a ROB entry waiting for its effective-address base.
    pub fn add_ea_dependent(&mut self, index: usize, rob: Handle) {
        if let Some(reg) = self.regs.get_mut(index) {
            reg.ea_dependents.push(rob);
        }
    }
}

/// The integer, floating-point and miscellaneous files of one core.
#[derive(Clone, Debug)]
pub struct PhysRegFiles {
    files: [RegisterFile; 3],
}

impl PhysRegFiles {
    /// Creates the three files with the given capacities.
    pub fn new(int: usize, fp: usize, misc: usize) -> Self {
        Self {
            files: [
                RegisterFile::new(RegClass::Int, int),
                RegisterFile::new(RegClass::Fp, fp),
                RegisterFile::new(RegClass::Misc, misc),
            ],
        }
    }

    /// File of `class`.
    #[inline]
    pub const fn file(&self, class: RegClass) -> &RegisterFile {
        &self.files[class.index()]
    }

    /// Mutable file of `class`.
    #[inline]
    pub const fn file_mut(&mut self, class: RegClass) -> &mut RegisterFile {
        &mut self.files[class.index()]
    }

    /// Returns true if `reg` holds a produced value.
    pub fn is_ready(&self, reg: PhysRegId) -> bool {
        self.file(reg.class).is_ready(reg.index)
    }

    /// State of `reg`.
    pub fn state(&self, reg: PhysRegId) -> Option<PhysRegState> {
        self.file(reg.class).state(reg.index)
    }

    /// Returns true if every file satisfies `free + in_use == capacity`.
    pub fn is_consistent(&self) -> bool {
        self.files.iter().all(RegisterFile::is_consistent)
    }

    /// Applies `op` to `reg`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::RegisterState`] if `reg` is not in a state `op`
    /// accepts. The register is left unchanged.
    pub fn apply(&mut self, reg: PhysRegId, op: RegOp, cycle: u64) -> SimResult<()> {
        let file = self.file_mut(reg.class);
        let moved = match op {
            RegOp::Commit => file.commit(reg.index),
            RegOp::Recover => file.recover(reg.index),
            RegOp::Reclaim => file.reclaim(reg.index),
        };
        if moved {
            return Ok(());
        }
        Err(SimError::RegisterState {
            cycle,
            reg: format!("{:?} p{}", reg.class, reg.index),
            state: self
                .state(reg)
                .map_or_else(|| "Missing".to_owned(), |s| format!("{s:?}")),
            operation: format!("{op:?}"),
        })
    }
}
