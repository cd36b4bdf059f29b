//! Core Definition and Per-Cycle Orchestration.
//!
//! This module defines the `Core` structure, the container for everything one
//! processor core shares between its hardware threads. It coordinates:
//! 1. **Threads:** Private pipelines (decode buffer, rename table, ROB, LSQ).
//! 2. **Shared Resources:** Physical register files, functional units and the
//!    instruction, load and store issue queues.
//! 3. **Cycle Order:** commit, writeback, LSQ refresh, wakeup, issue, dispatch,
//!    rename, fetch.
//! 4. **Functional Phases:** Fast-forward and cache warm-up cycles.

/// Functional execution for the fast-forward and warm-up phases.
pub mod functional;

use serde::Serialize;
use tracing::trace;

use crate::common::SimResult;
use crate::config::Config;
use crate::core::pipeline::regfile::PhysRegFiles;
use crate::core::pipeline::rob::EntryRef;
use crate::core::pipeline::stages::{
    commit_stage, dispatch_stage, fetch_stage, issue_stage, refresh_lsq_stage, rename_stage,
    wakeup_stage, writeback_stage,
};
use crate::core::thread::{Thread, ThreadState};
use crate::core::units::fu::FuPool;
use crate::isa::{ExecutionContext, IsaEngine};
use crate::sim::SimContext;
use crate::sim::event::{AccessTarget, CoreEvent};

/// An entry waiting in one of the core's issue queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSlot {
    /// Thread index within the core.
    pub thread: usize,
    /// The ROB or LSQ entry.
    pub entry: EntryRef,
}

/// Issue queues shared by the threads of a core.
#[derive(Clone, Debug, Default)]
pub struct IssueQueues {
    /// ROB entries with operands outstanding.
    pub waiting_instructions: Vec<QueueSlot>,
    /// ROB entries ready to issue.
    pub ready_instructions: Vec<QueueSlot>,
    /// Loads admitted by the LSQ refresh.
    pub ready_loads: Vec<QueueSlot>,
    /// Stores with operands outstanding.
    pub waiting_stores: Vec<QueueSlot>,
    /// Stores ready to issue.
    pub ready_stores: Vec<QueueSlot>,
}

impl IssueQueues {
    /// Drops every slot belonging to `thread`.
    pub fn purge_thread(&mut self, thread: usize) {
        for queue in [
            &mut self.waiting_instructions,
            &mut self.ready_instructions,
            &mut self.ready_loads,
            &mut self.waiting_stores,
            &mut self.ready_stores,
        ] {
            queue.retain(|s| s.thread != thread);
        }
    }

    /// Slots across all queues.
    pub fn len(&self) -> usize {
        self.waiting_instructions.len()
            + self.ready_instructions.len()
            + self.ready_loads.len()
            + self.waiting_stores.len()
            + self.ready_stores.len()
    }

    /// Returns true if every queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-core counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CoreStats {
    /// Measured cycles.
    pub cycles: u64,
    /// Warm-up cycles.
    pub warmup_cycles: u64,
    /// Fast-forward cycles.
    pub fast_forward_cycles: u64,
    /// Entries sent to functional units or memory.
    pub issued: u64,
    /// Completions drained by writeback.
    pub written_back: u64,
}

/// One processor core.
#[derive(Debug)]
pub struct Core {
    /// Core number.
    pub id: usize,
    /// Name, `c<id>`.
    pub name: String,
    /// Hardware threads.
    pub threads: Vec<Thread>,
    /// Physical register files shared by the threads.
    pub regs: PhysRegFiles,
    /// Functional units.
    pub fu: FuPool,
    /// Issue queues.
    pub queues: IssueQueues,
    /// Completions waiting for the writeback stage.
    pub completed: Vec<QueueSlot>,
    /// Instruction decoder and executor.
    pub isa: Box<dyn IsaEngine>,
    /// Instructions renamed and dispatched per cycle.
    pub decode_width: usize,
    /// Issue slots per cycle.
    pub issue_width: usize,
    /// Instructions retired per thread per cycle.
    pub commit_width: usize,
    /// Cycles without a commit before the watchdog fires.
    pub commit_timeout: u64,
    pub(crate) rename_cursor: usize,
    pub(crate) dispatch_cursor: usize,
    /// Counters.
    pub stats: CoreStats,
}

impl Core {
    /// Builds core `id`; `contexts` supplies one optional context per hardware
    /// thread, missing entries leave the thread idle.
    pub fn new(
        id: usize,
        config: &Config,
        contexts: Vec<Option<Box<dyn ExecutionContext>>>,
        isa: Box<dyn IsaEngine>,
    ) -> SimResult<Self> {
        let c = &config.core;
        let mut regs = PhysRegFiles::new(c.phys_int_regs, c.phys_fp_regs, c.phys_misc_regs);
        let mut contexts = contexts.into_iter();
        let threads = (0..c.threads_per_core)
            .map(|t| Thread::new(id, t, config, contexts.next().flatten(), &mut regs))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self {
            id,
            name: format!("c{id}"),
            threads,
            regs,
            fu: FuPool::new(&config.fu),
            queues: IssueQueues::default(),
            completed: Vec::new(),
            isa,
            decode_width: c.decode_width,
            issue_width: c.issue_width,
            commit_width: c.commit_width,
            commit_timeout: config.general.commit_timeout,
            rename_cursor: 0,
            dispatch_cursor: 0,
            stats: CoreStats::default(),
        })
    }

    /// Runs one measured cycle of the out-of-order pipeline.
    pub fn tick(&mut self, sim: &mut SimContext<'_>) -> SimResult<()> {
        let cycle = sim.cycle();
        for thread in &mut self.threads {
            thread.update_state();
        }
        commit_stage(self, cycle)?;
        writeback_stage(self, cycle);
        refresh_lsq_stage(self, cycle);
        wakeup_stage(self);
        issue_stage(self, sim);
        dispatch_stage(self);
        rename_stage(self, sim.ids, cycle);
        fetch_stage(self, sim);
        self.stats.cycles += 1;
        Ok(())
    }

    /// Runs one cache warm-up cycle: functional execution plus cache accesses.
    pub fn tick_warmup(&mut self, sim: &mut SimContext<'_>) {
        for thread in &mut self.threads {
            functional::warmup_one_cycle(self.id, thread, self.isa.as_ref(), sim);
        }
        self.stats.warmup_cycles += 1;
    }

    /// Runs one fast-forward cycle: each running thread executes one instruction.
    /// The cycle is counted only if some thread executed.
    pub fn tick_fast_forward(&mut self) {
        let mut executed = false;
        for thread in &mut self.threads {
            executed |= functional::fast_forward_one_cycle(thread, self.isa.as_ref());
        }
        if executed {
            self.stats.fast_forward_cycles += 1;
        }
    }

    /// Applies a continuation addressed to this core.
    pub fn handle(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::FuReleased { kind, epoch } => self.fu.release(kind, epoch),
            CoreEvent::OperationComplete { thread, entry } => {
                self.completed.push(QueueSlot { thread, entry });
            }
            CoreEvent::AccessComplete(token) => {
                let Some(thread) = self.threads.get_mut(token.thread) else {
                    return;
                };
                match token.target {
                    AccessTarget::Ifetch => thread.fetch_stalled = false,
                    AccessTarget::Warmup => {}
                    AccessTarget::Lsq(handle) => {
                        thread.outstanding_accesses = thread.outstanding_accesses.saturating_sub(1);
                        if let Some(entry) = thread.lsq.get_mut(handle) {
                            entry.in_flight = false;
                            if !entry.is_store {
                                self.completed.push(QueueSlot {
                                    thread: token.thread,
                                    entry: EntryRef::Lsq(handle),
                                });
                            }
                        } else {
                            trace!(thread = %thread.name, "access of a squashed entry completed");
                        }
                    }
                }
            }
        }
    }

    /// Returns true once every thread finished.
    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|t| t.state == ThreadState::Finished)
    }

    /// Instructions committed by all threads.
    pub fn committed(&self) -> u64 {
        self.threads.iter().map(|t| t.stats.committed).sum()
    }
}
