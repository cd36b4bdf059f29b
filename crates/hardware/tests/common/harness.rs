//! Logging setup, a memory-hierarchy driver and whole-machine run loops.

use cmpsim_core::common::SimResult;
use cmpsim_core::config::Config;
use cmpsim_core::sim::{AccessTarget, AccessToken, CoreEvent, Event, EventQueue, Simulation};
use cmpsim_core::soc::MemoryHierarchy;
use cmpsim_core::soc::memory::MemoryController;
use tracing_subscriber::EnvFilter;

/// Installs the test loggers once per process. `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drives a [`MemoryHierarchy`] without cores: accesses are submitted by the
/// test and completions are collected.
#[derive(Debug)]
pub struct MemoryDriver {
    pub memory: MemoryHierarchy,
    pub events: EventQueue<Event>,
    /// Completed accesses with their completion cycle.
    pub completed: Vec<(u64, AccessToken)>,
}

impl MemoryDriver {
    pub fn new(config: &Config) -> Self {
        init_logging();
        Self {
            memory: MemoryHierarchy::new(config),
            events: EventQueue::new(),
            completed: Vec::new(),
        }
    }

    pub fn with_controller(config: &Config, controller: Box<dyn MemoryController>) -> Self {
        init_logging();
        Self {
            memory: MemoryHierarchy::with_memory_controller(config, controller),
            events: EventQueue::new(),
            completed: Vec::new(),
        }
    }

    /// Token for an access of `core`; `tag` identifies it among the completions.
    ///
    /// The tag doubles as the thread index, so a tag below the core's thread
    /// count goes through that thread's TLB and any other tag is untranslated.
    pub const fn token(core: usize, tag: usize) -> AccessToken {
        AccessToken {
            core,
            thread: tag,
            target: AccessTarget::Warmup,
        }
    }

    /// Submits a load. Returns false if the data cache refused it.
    pub fn load(&mut self, core: usize, addr: u32, tag: usize) -> bool {
        if !self.memory.can_load(core, addr) {
            return false;
        }
        self.memory.load(core, addr, Self::token(core, tag), &mut self.events);
        true
    }

    /// Submits a store. Returns false if the data cache refused it.
    pub fn store(&mut self, core: usize, addr: u32, tag: usize) -> bool {
        if !self.memory.can_store(core, addr) {
            return false;
        }
        self.memory.store(core, addr, Self::token(core, tag), &mut self.events);
        true
    }

    /// Routes events until nothing is pending. Returns the cycle reached.
    ///
    /// # Panics
    ///
    /// Panics if the hierarchy is still busy after `max_cycles`.
    pub fn run_until_idle(&mut self, max_cycles: u64) -> SimResult<u64> {
        let start = self.events.current_cycle();
        loop {
            self.drain()?;
            if self.events.is_empty() && self.memory.is_idle() {
                log::debug!("hierarchy idle at cycle {}", self.events.current_cycle());
                return Ok(self.events.current_cycle());
            }
            assert!(
                self.events.current_cycle() - start < max_cycles,
                "hierarchy still busy after {max_cycles} cycles"
            );
            self.events.advance();
        }
    }

    /// Routes events cycle by cycle until `done` holds, at most `max_cycles`
    /// cycles. Returns true if `done` was reached.
    pub fn run_until<F>(&mut self, max_cycles: u64, mut done: F) -> SimResult<bool>
    where
        F: FnMut(&MemoryHierarchy) -> bool,
    {
        for _ in 0..max_cycles {
            self.drain()?;
            if done(&self.memory) {
                return Ok(true);
            }
            self.events.advance();
        }
        Ok(done(&self.memory))
    }

    fn drain(&mut self) -> SimResult<()> {
        while let Some(event) = self.events.pop_due() {
            match event {
                Event::Core {
                    event: CoreEvent::AccessComplete(token),
                    ..
                } => self.completed.push((self.events.current_cycle(), token)),
                Event::Core { .. } => {}
                Event::Memory(e) => self.memory.handle(e, &mut self.events)?,
            }
        }
        Ok(())
    }

    /// Completion cycle of the access tagged `tag` on `core`.
    pub fn completion_of(&self, core: usize, tag: usize) -> Option<u64> {
        self.completed
            .iter()
            .find(|(_, t)| t.core == core && t.thread == tag)
            .map(|&(cycle, _)| cycle)
    }
}

/// Steps `sim` until `done` holds, at most `max_steps` cycles. Returns true if
/// `done` was reached.
pub fn step_until<F>(sim: &mut Simulation, max_steps: u64, mut done: F) -> SimResult<bool>
where
    F: FnMut(&Simulation) -> bool,
{
    for _ in 0..max_steps {
        if done(sim) {
            return Ok(true);
        }
        sim.step()?;
    }
    Ok(done(sim))
}

/// Builds and runs a machine to completion.
pub fn run_programs(config: Config, programs: Vec<cmpsim_core::isa::Program>) -> SimResult<Simulation> {
    init_logging();
    let mut sim = Simulation::new(config, programs)?;
    sim.run()?;
    Ok(sim)
}
