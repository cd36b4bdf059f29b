//! Memory hierarchy façade seen by the cores.
//!
//! Owns the per-core L1 controllers (`2c` is the instruction cache of core
//! `c`, `2c + 1` its data cache), the per-thread TLBs, the directory and the
//! network, and routes memory events between them.

use tracing::trace;

use crate::common::{AccessType, SimError, SimResult};
use crate::config::Config;
use crate::sim::EventQueue;
use crate::sim::event::{AccessToken, Event, MemoryEvent};
use crate::soc::coherence::Fabric;
use crate::soc::coherence::directory::Directory;
use crate::soc::coherence::l1::L1Controller;
use crate::soc::coherence::message::NodeId;
use crate::soc::interconnect::Network;
use crate::soc::memory::MemoryController;
use crate::soc::tlb::{Tlb, Translations};

/// L1 controllers, TLBs, directory and network of one simulation.
#[derive(Debug)]
pub struct MemoryHierarchy {
    l1s: Vec<L1Controller>,
    /// Instruction TLBs by global thread id.
    itlbs: Vec<Tlb>,
    /// Data TLBs by global thread id.
    dtlbs: Vec<Tlb>,
    threads_per_core: usize,
    translations: Translations,
    directory: Directory,
    network: Network,
}

impl MemoryHierarchy {
    /// Builds the hierarchy for every core of a validated configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_directory(config, Directory::new(config))
    }

    /// Builds the hierarchy with the directory in front of `memory`.
    pub fn with_memory_controller(config: &Config, memory: Box<dyn MemoryController>) -> Self {
        Self::with_directory(config, Directory::with_memory(config, memory))
    }

    fn with_directory(config: &Config, directory: Directory) -> Self {
        let mut l1s = Vec::with_capacity(config.core.num_cores * 2);
        for core in 0..config.core.num_cores {
            l1s.push(L1Controller::new(
                2 * core,
                format!("l1i{core}"),
                &config.cache.l1i,
                config.protocol,
            ));
            l1s.push(L1Controller::new(
                2 * core + 1,
                format!("l1d{core}"),
                &config.cache.l1d,
                config.protocol,
            ));
        }
        let threads = config.total_threads();
        Self {
            l1s,
            itlbs: (0..threads)
                .map(|t| Tlb::new(format!("itlb{t}"), &config.tlb))
                .collect(),
            dtlbs: (0..threads)
                .map(|t| Tlb::new(format!("dtlb{t}"), &config.tlb))
                .collect(),
            threads_per_core: config.core.threads_per_core,
            translations: Translations::default(),
            directory,
            network: Network::new(&config.network),
        }
    }

    /// Instruction cache of `core`.
    pub fn l1i(&self, core: usize) -> Option<&L1Controller> {
        self.l1s.get(2 * core)
    }

    /// Data cache of `core`.
    pub fn l1d(&self, core: usize) -> Option<&L1Controller> {
        self.l1s.get(2 * core + 1)
    }

    /// Every L1 controller in id order.
    pub fn l1s(&self) -> &[L1Controller] {
        &self.l1s
    }

    /// Instruction TLB of global thread `thread`.
    pub fn itlb(&self, thread: usize) -> Option<&Tlb> {
        self.itlbs.get(thread)
    }

    /// Data TLB of global thread `thread`.
    pub fn dtlb(&self, thread: usize) -> Option<&Tlb> {
        self.dtlbs.get(thread)
    }

    /// Every instruction TLB, then every data TLB, in thread order.
    pub fn tlbs(&self) -> impl Iterator<Item = &Tlb> + '_ {
        self.itlbs.iter().chain(&self.dtlbs)
    }

    /// The directory.
    pub const fn directory(&self) -> &Directory {
        &self.directory
    }

    /// The coherence network.
    pub const fn network(&self) -> &Network {
        &self.network
    }

    /// Line size of the instruction cache of `core`.
    pub fn icache_line_bytes(&self, core: usize) -> u64 {
        self.l1i(core).map_or(1, L1Controller::line_bytes)
    }

    /// Returns true if `core` may start an instruction fetch of `addr`.
    pub fn can_ifetch(&self, core: usize, addr: u32) -> bool {
        self.can_access(2 * core, AccessType::Fetch, addr)
    }

    /// Starts an instruction fetch; `token` is signalled on completion.
    pub fn ifetch(&mut self, core: usize, addr: u32, token: AccessToken, events: &mut EventQueue<Event>) {
        self.submit(2 * core, AccessType::Fetch, addr, token, events);
    }

    /// Returns true if `core` may start a load of `addr`.
    pub fn can_load(&self, core: usize, addr: u32) -> bool {
        self.can_access(2 * core + 1, AccessType::Read, addr)
    }

    /// Starts a load; `token` is signalled on completion.
    pub fn load(&mut self, core: usize, addr: u32, token: AccessToken, events: &mut EventQueue<Event>) {
        self.submit(2 * core + 1, AccessType::Read, addr, token, events);
    }

    /// Returns true if `core` may start a store to `addr`.
    pub fn can_store(&self, core: usize, addr: u32) -> bool {
        self.can_access(2 * core + 1, AccessType::Write, addr)
    }

    /// Starts a store; `token` is signalled on completion.
    pub fn store(&mut self, core: usize, addr: u32, token: AccessToken, events: &mut EventQueue<Event>) {
        self.submit(2 * core + 1, AccessType::Write, addr, token, events);
    }

    fn can_access(&self, l1: usize, kind: AccessType, addr: u32) -> bool {
        self.l1s
            .get(l1)
            .is_some_and(|c| c.can_access(kind, c.tag_of(u64::from(addr))))
    }

    fn submit(
        &mut self,
        l1: usize,
        kind: AccessType,
        addr: u32,
        token: AccessToken,
        events: &mut EventQueue<Event>,
    ) {
        let Some(controller) = self.l1s.get_mut(l1) else {
            return;
        };
        let tag = controller.tag_of(u64::from(addr));
        if !controller.begin_access(kind, tag, token) {
            return;
        }
        events.schedule(
            Event::Memory(MemoryEvent::L1Access { l1, kind, tag }),
            controller.latency(),
        );
        if let Some(tlb) = self.tlb_mut(kind, token) {
            let ready_at = events.current_cycle() + tlb.translate(u64::from(addr));
            self.translations.start(l1, tag, ready_at);
        }
    }

    /// TLB translating `kind` accesses of the thread behind `token`. An access
    /// whose thread index lies outside the core has none and is not translated.
    fn tlb_mut(&mut self, kind: AccessType, token: AccessToken) -> Option<&mut Tlb> {
        if token.thread >= self.threads_per_core {
            return None;
        }
        let thread = token.core * self.threads_per_core + token.thread;
        match kind {
            AccessType::Fetch => self.itlbs.get_mut(thread),
            AccessType::Read | AccessType::Write => self.dtlbs.get_mut(thread),
        }
    }

    /// Handles one memory event.
    pub fn handle(&mut self, event: MemoryEvent, events: &mut EventQueue<Event>) -> SimResult<()> {
        let cycle = events.current_cycle();
        let mut fabric = Fabric {
            events,
            network: &mut self.network,
            translations: &mut self.translations,
        };
        match event {
            MemoryEvent::L1Access { l1, kind, tag } => {
                trace!(cycle, l1, ?kind, tag, "l1 access");
                let controller = self.l1s.get_mut(l1).ok_or_else(|| SimError::UnknownTarget {
                    what: format!("L1 controller {l1}"),
                    cycle,
                })?;
                controller.access(kind, tag, &mut fabric)
            }
            MemoryEvent::Deliver {
                to: NodeId::L1(l1),
                message,
            } => {
                let controller = self.l1s.get_mut(l1).ok_or_else(|| SimError::UnknownTarget {
                    what: format!("L1 controller {l1}"),
                    cycle,
                })?;
                controller.receive(message, &mut fabric)
            }
            MemoryEvent::Deliver {
                to: NodeId::Directory,
                message,
            } => self.directory.receive(message, &mut fabric),
            MemoryEvent::MemoryData { tag } => self.directory.memory_data(tag, &mut fabric),
        }
    }

    /// Checks the directory invariants.
    pub fn check_invariants(&self, cycle: u64) -> SimResult<()> {
        self.directory.check_invariants(cycle)
    }

    /// Returns true when no L1 has an access in flight.
    pub fn is_idle(&self) -> bool {
        self.l1s.iter().all(|l1| l1.pending_accesses() == 0)
    }
}
