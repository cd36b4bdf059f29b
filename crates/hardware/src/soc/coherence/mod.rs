//! Directory-based MSI/MESI coherence engine.
//!
//! Per-core L1 controllers ([`l1::L1Controller`]) hold lines in a set-associative
//! array. Each line runs a coherence state machine (stable states from
//! [`mesi`], transient states in [`l1::fsm`]) and a lock ([`lock`]) that keeps a
//! second hit, evict or fill transaction off the line while one is in flight.
//! The shared [`directory::Directory`] tracks owner and sharers per line,
//! serializes conflicting requests and talks to main memory.
//!
//! Controllers never call each other. They send [`message::Message`]s through a
//! [`Fabric`], which books the transfer on the network and schedules delivery
//! in the event queue.

/// Shared directory controller.
pub mod directory;
/// L1 cache controller.
pub mod l1;
/// Line lock state machine.
pub mod lock;
/// Stable-state MSI/MESI transitions.
pub mod mesi;
/// Coherence messages.
pub mod message;

use tracing::trace;

use self::message::{Message, NodeId};
use crate::common::AccessType;
use crate::sim::EventQueue;
use crate::sim::event::{AccessToken, CoreEvent, Event, MemoryEvent};
use crate::soc::interconnect::Network;
use crate::soc::tlb::Translations;

/// Event queue, network and translation deadlines, lent to a controller
/// while it handles one event.
#[derive(Debug)]
pub struct Fabric<'a> {
    /// Simulation event queue.
    pub events: &'a mut EventQueue<Event>,
    /// Coherence network.
    pub network: &'a mut Network,
    /// Translations of the in-flight L1 accesses.
    pub translations: &'a mut Translations,
}

impl Fabric<'_> {
    /// Current cycle.
    #[inline]
    pub const fn now(&self) -> u64 {
        self.events.current_cycle()
    }

    /// Sends `message` to `to` after `extra` cycles of local processing.
    pub fn send(&mut self, to: NodeId, message: Message, line_bytes: u64, extra: u64) {
        let now = self.now();
        let size = message.size(line_bytes);
        let delay = self.network.transfer(now, message.sender, to, size, extra);
        trace!(cycle = now, ?message, ?to, delay, "send");
        self.events
            .schedule(Event::Memory(MemoryEvent::Deliver { to, message }), delay);
    }

    /// Redelivers a stalled message to `to` during the current cycle.
    pub fn replay(&mut self, to: NodeId, mut message: Message) {
        message.replayed = true;
        self.events
            .schedule(Event::Memory(MemoryEvent::Deliver { to, message }), 0);
    }

    /// Schedules L1 controller `l1` to service (or retry) an access.
    pub fn access(&mut self, l1: usize, kind: AccessType, tag: u64, delay: u64) {
        self.events
            .schedule(Event::Memory(MemoryEvent::L1Access { l1, kind, tag }), delay);
    }

    /// Finishes the access to `tag` on `l1`: each of `tokens` is signalled
    /// once the translation of the access is done too.
    pub fn complete(&mut self, l1: usize, tag: u64, tokens: Vec<AccessToken>) {
        let now = self.now();
        let delay = self.translations.finish(l1, tag, now);
        for token in tokens {
            self.events.schedule(
                Event::Core {
                    core: token.core,
                    event: CoreEvent::AccessComplete(token),
                },
                delay,
            );
        }
    }
}
