//! Hardware thread state.
//!
//! A thread owns everything in the pipeline that is private to one program:
//! the execution context, the branch predictor, the decode buffer, the rename
//! table, the reorder buffer and the load/store queue. Stages that need shared
//! core resources (physical registers, functional units, issue queues) receive
//! them alongside the thread.

use std::collections::VecDeque;

use serde::Serialize;

use crate::common::{SimError, SimResult};
use crate::config::Config;
use crate::core::pipeline::regfile::{PhysRegFiles, PhysRegId};
use crate::core::pipeline::rob::{LoadStoreQueue, ReorderBuffer};
use crate::core::units::bru::{BranchPredictorWrapper, PredictorUpdate};
use crate::isa::{ArchReg, ContextState, DynamicInstruction, ExecutionContext, RegClass};

/// Role a thread plays in the workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ThreadRole {
    /// The thread whose progress the run measures.
    Main,
    /// A helper thread running alongside the main thread.
    Helper,
    /// Any other thread.
    Other,
}

/// Pipeline state of a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum ThreadState {
    /// Fetching and committing.
    #[default]
    Running,
    /// A squash emptied the pipeline; memory accesses of squashed entries are
    /// still outstanding.
    Squashing,
    /// The program ended and the pipeline drained.
    Finished,
}

/// Instruction waiting between fetch and rename.
#[derive(Clone, Debug)]
pub struct DecodeBufferEntry {
    /// The instruction, executed functionally at fetch.
    pub inst: DynamicInstruction,
    /// Next pc actually executed.
    pub npc: u32,
    /// Next pc fetch followed.
    pub predicted_npc: u32,
    /// Return address stack top before the prediction.
    pub ras_checkpoint: usize,
    /// Predictor state to train at commit.
    pub predictor_update: PredictorUpdate,
    /// Fetched while the context was speculative.
    pub speculative: bool,
}

/// Per-thread counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ThreadStats {
    /// Instructions retired by the pipeline.
    pub committed: u64,
    /// Instructions executed functionally during fast-forward and warm-up.
    pub functional: u64,
    /// Instructions placed in the decode buffer.
    pub fetched: u64,
    /// Pipeline squashes.
    pub squashes: u64,
    /// Entries discarded by squashes.
    pub squashed_entries: u64,
    /// Committed control instructions.
    pub predictions: u64,
    /// Committed control instructions whose predicted next pc was wrong.
    pub mispredictions: u64,
    /// Fetch stopped because the decode buffer was full.
    pub fetch_stalls_decode_buffer_full: u64,
    /// Fetch waited for the instruction cache.
    pub fetch_stalls_icache: u64,
    /// Rename found the decode buffer empty.
    pub rename_stalls_decode_buffer_empty: u64,
    /// Rename found the reorder buffer full.
    pub rename_stalls_rob_full: u64,
    /// Rename found the load/store queue full.
    pub rename_stalls_lsq_full: u64,
    /// Rename found too few free physical registers.
    pub rename_stalls_no_phys_reg: u64,
    /// Issue found no free functional unit.
    pub issue_stalls_no_free_fu: u64,
    /// Issue could not start a load.
    pub issue_stalls_cannot_load: u64,
    /// Issue could not start a store.
    pub issue_stalls_cannot_store: u64,
    /// Loads satisfied from an older store in the load/store queue.
    pub forwarded_loads: u64,
    /// Cycles the reorder buffer head spent incomplete.
    pub cycles_head_incomplete: u64,
    /// Commit watchdog firings.
    pub commit_timeouts: u32,
}

impl ThreadStats {
    /// Fraction of committed control instructions that were predicted correctly.
    pub fn prediction_accuracy(&self) -> f64 {
        if self.predictions == 0 {
            0.0
        } else {
            (self.predictions - self.mispredictions) as f64 / self.predictions as f64
        }
    }
}

/// Architectural-to-physical mapping of one thread.
#[derive(Clone, Debug)]
pub struct RenameTable {
    maps: [Vec<PhysRegId>; 3],
}

impl RenameTable {
    /// Reserves one committed physical register per architectural register.
    pub fn new(regs: &mut PhysRegFiles) -> SimResult<Self> {
        let mut maps: [Vec<PhysRegId>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for class in RegClass::ALL {
            for n in 0..class.arch_count() {
                let arch = match class {
                    RegClass::Int => ArchReg::Int(n as u8),
                    RegClass::Fp => ArchReg::Fp(n as u8),
                    RegClass::Misc => ArchReg::Misc(n as u8),
                };
                let reg = regs.file_mut(class).reserve(arch).ok_or_else(|| {
                    SimError::config(format!(
                        "physical {class:?} register file too small for the architectural registers"
                    ))
                })?;
                maps[class.index()].push(reg);
            }
        }
        Ok(Self { maps })
    }

    /// Current mapping of `arch`.
    pub fn get(&self, arch: ArchReg) -> Option<PhysRegId> {
        self.maps[arch.class().index()].get(arch.index()).copied()
    }

    /// Remaps `arch`.
    pub fn set(&mut self, arch: ArchReg, reg: PhysRegId) {
        if let Some(slot) = self.maps[arch.class().index()].get_mut(arch.index()) {
            *slot = reg;
        }
    }
}

/// Instruction held by the cache warm-up phase until its accesses are accepted.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WarmupInst {
    pub pc: u32,
    pub load: bool,
    pub store: bool,
    pub ea: u32,
}

/// One hardware thread.
#[derive(Debug)]
pub struct Thread {
    /// Name, `c<core>t<index>`.
    pub name: String,
    /// Index within the core.
    pub index: usize,
    /// Machine-wide thread id.
    pub global_id: usize,
    /// Workload role.
    pub role: ThreadRole,
    /// Architectural state; `None` for an idle hardware thread.
    pub context: Option<Box<dyn ExecutionContext>>,
    /// Branch predictor.
    pub predictor: BranchPredictorWrapper,
    /// Fetched, not yet renamed instructions.
    pub decode_buffer: VecDeque<DecodeBufferEntry>,
    /// Decode buffer capacity.
    pub decode_buffer_capacity: usize,
    /// Rename table.
    pub rename_table: RenameTable,
    /// Reorder buffer.
    pub rob: ReorderBuffer,
    /// Load/store queue.
    pub lsq: LoadStoreQueue,
    /// Address of the next instruction to fetch.
    pub fetch_pc: u32,
    /// Waiting for an instruction cache line.
    pub fetch_stalled: bool,
    /// Last instruction cache line requested.
    pub last_fetch_line: Option<u32>,
    /// Pipeline state.
    pub state: ThreadState,
    /// Memory accesses issued and not yet completed.
    pub outstanding_accesses: usize,
    /// Cycle of the last commit, or of the last watchdog firing.
    pub last_commit_cycle: u64,
    pub(crate) warmup: Option<WarmupInst>,
    /// Counters.
    pub stats: ThreadStats,
}

impl Thread {
    /// Builds thread `index` of core `core` and reserves its architectural registers.
    pub fn new(
        core: usize,
        index: usize,
        config: &Config,
        context: Option<Box<dyn ExecutionContext>>,
        regs: &mut PhysRegFiles,
    ) -> SimResult<Self> {
        let global_id = core * config.core.threads_per_core + index;
        let role = if global_id == config.threads.main_thread {
            ThreadRole::Main
        } else if config.threads.helper_thread == Some(global_id) {
            ThreadRole::Helper
        } else {
            ThreadRole::Other
        };
        let fetch_pc = context.as_ref().map_or(0, |c| c.npc());
        let state = match &context {
            Some(c) if c.state() == ContextState::Running => ThreadState::Running,
            _ => ThreadState::Finished,
        };
        Ok(Self {
            name: format!("c{core}t{index}"),
            index,
            global_id,
            role,
            context,
            predictor: BranchPredictorWrapper::new(&config.branch_predictor),
            decode_buffer: VecDeque::with_capacity(config.core.decode_buffer_capacity),
            decode_buffer_capacity: config.core.decode_buffer_capacity,
            rename_table: RenameTable::new(regs)?,
            rob: ReorderBuffer::new(config.core.rob_capacity),
            lsq: LoadStoreQueue::new(config.core.lsq_capacity),
            fetch_pc,
            fetch_stalled: false,
            last_fetch_line: None,
            state,
            outstanding_accesses: 0,
            last_commit_cycle: 0,
            warmup: None,
            stats: ThreadStats::default(),
        })
    }

    /// Returns true if the decode buffer cannot take another entry.
    #[inline]
    pub fn decode_buffer_full(&self) -> bool {
        self.decode_buffer.len() >= self.decode_buffer_capacity
    }

    /// Returns true if the context exists and still has instructions to run.
    pub fn context_running(&self) -> bool {
        self.context
            .as_ref()
            .is_some_and(|c| c.state() == ContextState::Running)
    }

    /// Returns true if nothing is in flight in this thread's pipeline.
    pub fn is_drained(&self) -> bool {
        self.rob.is_empty() && self.lsq.is_empty() && self.decode_buffer.is_empty()
    }

    /// Advances the thread state machine at the start of a cycle.
    pub fn update_state(&mut self) {
        match self.state {
            ThreadState::Squashing if self.outstanding_accesses == 0 => {
                self.state = ThreadState::Running;
            }
            ThreadState::Running if !self.context_running() && self.is_drained() => {
                self.state = ThreadState::Finished;
            }
            _ => {}
        }
    }

    /// Re-aligns fetch with the context after a functional phase.
    pub fn resync(&mut self, cycle: u64) {
        if let Some(ctx) = &self.context {
            self.fetch_pc = ctx.npc();
        }
        self.last_commit_cycle = cycle;
        self.warmup = None;
        if self.state == ThreadState::Running && !self.context_running() && self.is_drained() {
            self.state = ThreadState::Finished;
        }
    }
}
