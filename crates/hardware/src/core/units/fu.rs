//! Functional-unit pool shared by the threads of a core.
//!
//! Each operation class maps to one unit kind with an operation latency (cycles
//! until the result is available) and an issue latency (cycles until the unit
//! accepts another operation). Pipelined units have an issue latency of 1.
//!
//! | Kind | Units | Operations (operation / issue latency) |
//! |---|---|---|
//! | IntAlu | 8 | IntAlu 2/1 |
//! | IntMultDiv | 2 | IntMult 3/1, IntDiv 20/19 |
//! | FpAdder | 8 | FpAdd 4/1 |
//! | FpMultDiv | 2 | FpMult 8/1, FpDiv 40/20, FpSqrt 80/40 |
//! | MemoryPort | 4 | ReadPort 1/1, WritePort 1/1 |

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::FuConfig;
use crate::isa::FuOperation;

/// Functional unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FuKind {
    /// Integer ALU.
    IntAlu,
    /// Integer multiplier/divider.
    IntMultDiv,
    /// Floating-point adder.
    FpAdder,
    /// Floating-point multiplier/divider.
    FpMultDiv,
    /// Memory address port.
    MemoryPort,
}

impl FuKind {
    const ALL: [Self; 5] = [
        Self::IntAlu,
        Self::IntMultDiv,
        Self::FpAdder,
        Self::FpMultDiv,
        Self::MemoryPort,
    ];

    const fn index(self) -> usize {
        match self {
            Self::IntAlu => 0,
            Self::IntMultDiv => 1,
            Self::FpAdder => 2,
            Self::FpMultDiv => 3,
            Self::MemoryPort => 4,
        }
    }
}

/// Unit kind, operation latency and issue latency of `op`.
pub const fn timing(op: FuOperation) -> (FuKind, u64, u64) {
    match op {
        FuOperation::IntAlu => (FuKind::IntAlu, 2, 1),
        FuOperation::IntMult => (FuKind::IntMultDiv, 3, 1),
        FuOperation::IntDiv => (FuKind::IntMultDiv, 20, 19),
        FuOperation::FpAdd => (FuKind::FpAdder, 4, 1),
        FuOperation::FpMult => (FuKind::FpMultDiv, 8, 1),
        FuOperation::FpDiv => (FuKind::FpMultDiv, 40, 20),
        FuOperation::FpSqrt => (FuKind::FpMultDiv, 80, 40),
        FuOperation::ReadPort | FuOperation::WritePort => (FuKind::MemoryPort, 1, 1),
    }
}

/// A unit handed out by [`FuPool::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuGrant {
    /// Unit kind; release it with [`FuPool::release`].
    pub kind: FuKind,
    /// Cycles until the result is ready.
    pub operation_latency: u64,
    /// Cycles until the unit is free again.
    pub issue_latency: u64,
    /// Pool epoch at acquisition.
    pub epoch: u64,
}

/// Busy counters per unit kind.
#[derive(Debug)]
pub struct FuPool {
    capacity: [usize; 5],
    busy: [usize; 5],
    epoch: u64,
    /// Acquisitions that found no free unit, per operation.
    pub no_free_unit: BTreeMap<FuOperation, u64>,
}

impl FuPool {
    /// Creates a pool with the configured number of units per kind.
    pub fn new(config: &FuConfig) -> Self {
        Self {
            capacity: [
                config.int_alu,
                config.int_mult_div,
                config.fp_adder,
                config.fp_mult_div,
                config.memory_port,
            ],
            busy: [0; 5],
            epoch: 0,
            no_free_unit: BTreeMap::new(),
        }
    }

    /// Takes a unit for `op`, or counts a structural stall and returns `None`.
    pub fn acquire(&mut self, op: FuOperation) -> Option<FuGrant> {
        let (kind, operation_latency, issue_latency) = timing(op);
        let i = kind.index();
        if self.busy[i] >= self.capacity[i] {
            *self.no_free_unit.entry(op).or_insert(0) += 1;
            return None;
        }
        self.busy[i] += 1;
        Some(FuGrant {
            kind,
            operation_latency,
            issue_latency,
            epoch: self.epoch,
        })
    }

    /// Returns a unit acquired during `epoch`. Releases from before the last
    /// [`FuPool::release_all`] are ignored.
    pub fn release(&mut self, kind: FuKind, epoch: u64) {
        if epoch == self.epoch {
            let slot = &mut self.busy[kind.index()];
            *slot = slot.saturating_sub(1);
        }
    }

    /// Frees every unit (on squash).
    pub fn release_all(&mut self) {
        self.busy = [0; 5];
        self.epoch += 1;
    }

    /// Units of `kind` currently busy.
    pub const fn busy(&self, kind: FuKind) -> usize {
        self.busy[kind.index()]
    }

    /// Total acquisitions that found no free unit.
    pub fn stalls(&self) -> u64 {
        self.no_free_unit.values().sum()
    }

    /// Returns true if every unit is free.
    pub fn is_idle(&self) -> bool {
        FuKind::ALL.iter().all(|&k| self.busy(k) == 0)
    }
}
