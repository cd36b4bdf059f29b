//! Top-level simulation.
//!
//! Owns the cores, the memory hierarchy, the event clock and the id counter.
//! A run goes through three phases:
//! 1. **Fast-Forward:** Programs execute functionally, without timing.
//! 2. **Warm-Up:** Programs execute functionally one instruction per cycle while
//!    accessing the caches.
//! 3. **Measurement:** The full out-of-order pipeline and coherence engine run,
//!    bounded by `general.max_cycles`.
//!
//! Within a measured cycle every core ticks, then every event due this cycle is
//! routed to its core or to the hierarchy, then the clock advances.

use serde::Serialize;
use tracing::{info, trace};

use crate::common::{IdCounter, SimError, SimResult};
use crate::config::Config;
use crate::core::Core;
use crate::core::thread::{Thread, ThreadRole};
use crate::isa::{ExecutionContext, IsaEngine, Program, ProgramContext, SimpleIsa};
use crate::sim::SimContext;
use crate::sim::event::Event;
use crate::sim::event_queue::EventQueue;
use crate::soc::MemoryHierarchy;
use crate::soc::memory::controller::MemoryController;
use crate::stats::SimStats;

/// Simulation phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Functional execution without timing.
    FastForward,
    /// Functional execution with cache accesses.
    Warmup,
    /// Cycle-accurate execution.
    Measurement,
}

/// A configured machine plus its workload.
#[derive(Debug)]
pub struct Simulation {
    config: Config,
    cores: Vec<Core>,
    memory: MemoryHierarchy,
    events: EventQueue<Event>,
    ids: IdCounter,
    phase: Phase,
    measured_cycles: u64,
}

impl Simulation {
    /// Builds a machine running `programs` on the toy ISA. Program `i` runs on
    /// global thread `i`; threads beyond the programs stay idle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is invalid or there are
    /// more programs than hardware threads.
    pub fn new(config: Config, programs: Vec<Program>) -> SimResult<Self> {
        let contexts = program_contexts(&config, programs)?;
        Self::with_contexts(config, contexts, || Box::new(SimpleIsa))
    }

    /// Like [`Simulation::new`], with the directory in front of `memory`
    /// instead of the controller named by `memory.controller`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is invalid or there are
    /// more programs than hardware threads.
    pub fn with_memory_controller(
        config: Config,
        programs: Vec<Program>,
        memory: Box<dyn MemoryController>,
    ) -> SimResult<Self> {
        let contexts = program_contexts(&config, programs)?;
        Self::assemble(config, contexts, || Box::new(SimpleIsa), Some(memory))
    }

    /// Builds a machine from explicit contexts, one slot per global thread id,
    /// and an instruction set per core.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is invalid.
    pub fn with_contexts<F>(
        config: Config,
        contexts: Vec<Option<Box<dyn ExecutionContext>>>,
        make_isa: F,
    ) -> SimResult<Self>
    where
        F: Fn() -> Box<dyn IsaEngine>,
    {
        Self::assemble(config, contexts, make_isa, None)
    }

    fn assemble<F>(
        config: Config,
        contexts: Vec<Option<Box<dyn ExecutionContext>>>,
        make_isa: F,
        memory: Option<Box<dyn MemoryController>>,
    ) -> SimResult<Self>
    where
        F: Fn() -> Box<dyn IsaEngine>,
    {
        config.validate()?;
        let per_core = config.core.threads_per_core;
        let mut contexts = contexts.into_iter();
        let mut cores = Vec::with_capacity(config.core.num_cores);
        for id in 0..config.core.num_cores {
            let slots: Vec<_> = (0..per_core).map(|_| contexts.next().flatten()).collect();
            cores.push(Core::new(id, &config, slots, make_isa())?);
        }
        info!(
            cores = config.core.num_cores,
            threads_per_core = per_core,
            protocol = ?config.protocol,
            "machine built"
        );
        let memory = match memory {
            Some(controller) => MemoryHierarchy::with_memory_controller(&config, controller),
            None => MemoryHierarchy::new(&config),
        };
        Ok(Self {
            memory,
            config,
            cores,
            events: EventQueue::new(),
            ids: IdCounter::new(),
            phase: Phase::FastForward,
            measured_cycles: 0,
        })
    }

    /// Runs every phase to completion.
    ///
    /// # Errors
    ///
    /// Propagates protocol violations and liveness failures.
    pub fn run(&mut self) -> SimResult<()> {
        self.fast_forward();
        self.warmup()?;
        self.measure()
    }

    /// Executes functionally until the main thread has run
    /// `general.fast_forward_instructions` instructions.
    pub fn fast_forward(&mut self) {
        self.phase = Phase::FastForward;
        let target = self.config.general.fast_forward_instructions;
        if target == 0 {
            return;
        }
        info!(instructions = target, "fast-forward started");
        while self.main_thread_progress() < target && self.any_context_running() {
            for core in &mut self.cores {
                core.tick_fast_forward();
            }
        }
        self.resync_threads();
        info!(executed = self.main_thread_progress(), "fast-forward finished");
    }

    /// Executes functionally with cache accesses for `general.warmup_instructions`
    /// further main-thread instructions.
    ///
    /// # Errors
    ///
    /// Propagates protocol violations raised by the hierarchy.
    pub fn warmup(&mut self) -> SimResult<()> {
        self.phase = Phase::Warmup;
        let count = self.config.general.warmup_instructions;
        if count == 0 {
            return Ok(());
        }
        let target = self.main_thread_progress() + count;
        info!(instructions = count, cycle = self.cycle(), "cache warm-up started");
        while self.main_thread_progress() < target && self.any_context_running() {
            let mut sim = SimContext {
                events: &mut self.events,
                memory: &mut self.memory,
                ids: &mut self.ids,
            };
            for core in &mut self.cores {
                core.tick_warmup(&mut sim);
            }
            self.drain_events()?;
            self.events.advance();
        }
        self.resync_threads();
        info!(cycle = self.cycle(), "cache warm-up finished");
        Ok(())
    }

    /// Runs the pipeline until every thread finished or `general.max_cycles`
    /// measured cycles elapsed.
    ///
    /// # Errors
    ///
    /// Propagates protocol violations and liveness failures.
    pub fn measure(&mut self) -> SimResult<()> {
        self.phase = Phase::Measurement;
        let max_cycles = self.config.general.max_cycles;
        info!(cycle = self.cycle(), max_cycles, "measurement started");
        while !self.is_finished() && self.measured_cycles < max_cycles {
            self.step()?;
        }
        self.check_invariants()?;
        info!(
            cycle = self.cycle(),
            measured = self.measured_cycles,
            committed = self.committed(),
            finished = self.is_finished(),
            "measurement finished"
        );
        Ok(())
    }

    /// Runs one measured cycle.
    ///
    /// # Errors
    ///
    /// Propagates protocol violations and liveness failures.
    pub fn step(&mut self) -> SimResult<()> {
        let mut sim = SimContext {
            events: &mut self.events,
            memory: &mut self.memory,
            ids: &mut self.ids,
        };
        for core in &mut self.cores {
            core.tick(&mut sim)?;
        }
        self.drain_events()?;
        self.events.advance();
        self.measured_cycles += 1;
        Ok(())
    }

    /// Routes every event due at the current cycle.
    fn drain_events(&mut self) -> SimResult<()> {
        while let Some(event) = self.events.pop_due() {
            match event {
                Event::Core { core, event } => {
                    trace!(cycle = self.events.current_cycle(), core, ?event, "core event");
                    let target = self.cores.get_mut(core).ok_or_else(|| SimError::UnknownTarget {
                        what: format!("core {core}"),
                        cycle: self.events.current_cycle(),
                    })?;
                    target.handle(event);
                }
                Event::Memory(event) => self.memory.handle(event, &mut self.events)?,
            }
        }
        Ok(())
    }

    fn resync_threads(&mut self) {
        let cycle = self.events.current_cycle();
        for thread in self.cores.iter_mut().flat_map(|c| c.threads.iter_mut()) {
            thread.resync(cycle);
        }
    }

    fn any_context_running(&self) -> bool {
        self.threads().any(Thread::context_running)
    }

    /// Instructions the main thread executed functionally. Without a main
    /// thread context, the least advanced running thread counts.
    fn main_thread_progress(&self) -> u64 {
        if let Some(main) = self.main_thread().filter(|t| t.context.is_some()) {
            return if main.context_running() {
                main.stats.functional
            } else {
                u64::MAX
            };
        }
        self.threads()
            .filter(|t| t.context_running())
            .map(|t| t.stats.functional)
            .min()
            .unwrap_or(u64::MAX)
    }

    /// Returns true once every thread finished.
    pub fn is_finished(&self) -> bool {
        self.cores.iter().all(Core::is_finished)
    }

    /// Checks the directory invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ProtocolViolation`] describing the first broken line.
    pub fn check_invariants(&self) -> SimResult<()> {
        self.memory.check_invariants(self.cycle())
    }

    /// Returns true if every physical register file satisfies
    /// `free + in use == capacity`.
    pub fn regfiles_consistent(&self) -> bool {
        self.cores.iter().all(|c| c.regs.is_consistent())
    }

    /// Current cycle.
    pub const fn cycle(&self) -> u64 {
        self.events.current_cycle()
    }

    /// Cycles run by [`Simulation::measure`] and [`Simulation::step`].
    pub const fn measured_cycles(&self) -> u64 {
        self.measured_cycles
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Validated configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The cores.
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Mutable access to the cores, for tests that drive the pipeline directly.
    pub fn cores_mut(&mut self) -> &mut [Core] {
        &mut self.cores
    }

    /// The memory hierarchy.
    pub const fn memory(&self) -> &MemoryHierarchy {
        &self.memory
    }

    /// Every hardware thread in global id order.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> + '_ {
        self.cores.iter().flat_map(|c| c.threads.iter())
    }

    /// The thread with the main role, if any.
    pub fn main_thread(&self) -> Option<&Thread> {
        self.threads().find(|t| t.role == ThreadRole::Main)
    }

    /// Instructions committed by every thread.
    pub fn committed(&self) -> u64 {
        self.cores.iter().map(Core::committed).sum()
    }

    /// Dynamic ids handed out so far.
    pub const fn ids_issued(&self) -> u64 {
        self.ids.issued()
    }

    /// Collects the statistics of every component.
    pub fn stats(&self) -> SimStats {
        SimStats::collect(self)
    }
}

/// One program context per global thread, in program order.
fn program_contexts(
    config: &Config,
    programs: Vec<Program>,
) -> SimResult<Vec<Option<Box<dyn ExecutionContext>>>> {
    if programs.len() > config.total_threads() {
        return Err(SimError::config(format!(
            "{} programs for {} hardware threads",
            programs.len(),
            config.total_threads()
        )));
    }
    Ok(programs
        .into_iter()
        .map(|p| Some(Box::new(ProgramContext::new(p)) as Box<dyn ExecutionContext>))
        .collect())
}
