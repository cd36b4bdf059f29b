//! Shared directory controller.
//!
//! The directory is the serialization point of the protocol. It keeps, per
//! line, the owner (a single L1 holding the line writable) or the set of
//! sharers, forwards requests to the owner, invalidates sharers, and fetches
//! lines from main memory. Its array has finite capacity; making room for a
//! new line recalls every cached copy of the victim first.

/// Directory state machine.
pub mod fsm;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::Fabric;
use super::message::{Message, MessageKind, NodeId};
use crate::common::{SimError, SimResult};
use crate::config::{Config, Protocol};
use crate::soc::cache::{CacheArray, LineId};
use crate::soc::memory::controller::{self, MemoryController};

/// Directory-side line state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DirState {
    /// No cache holds the line.
    #[default]
    I,
    /// Fetching from memory for a reader.
    IsD,
    /// Fetching from memory for a writer.
    ImD,
    /// One or more caches hold read-only copies.
    S,
    /// One cache owns the line (Modified or Exclusive).
    M,
    /// The owner was asked to share; waiting for its copy-back.
    SD,
    /// Recalling an owned victim.
    MiA,
    /// Recalling a shared victim.
    SiA,
}

/// One directory entry.
#[derive(Debug, Default)]
pub struct DirLine {
    state: DirState,
    owner: Option<usize>,
    sharers: BTreeSet<usize>,
    requester: Option<usize>,
    /// Tag the recall of this line is making room for.
    evicter: Option<u64>,
    /// Tag being recalled while the line is in `MiA`/`SiA`.
    victim: Option<u64>,
    recall_acks: usize,
    recall_dirty: bool,
    /// The owner asked for write permission; memory may be stale.
    dirty: bool,
    stalled: Vec<Message>,
}

/// Directory counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DirectoryStats {
    /// GetS requests received.
    pub get_s: u64,
    /// GetM requests received.
    pub get_m: u64,
    /// PutS and PutM requests received.
    pub puts: u64,
    /// Requests that found their line tracked.
    pub hits: u64,
    /// Requests that allocated a line.
    pub misses: u64,
    /// Lines read from memory.
    pub memory_reads: u64,
    /// Lines written back to memory.
    pub memory_writes: u64,
    /// Memory cycles spent on posted writebacks.
    pub writeback_cycles: u64,
    /// Victims recalled from the L1s.
    pub recalls: u64,
    /// Requests stalled behind a transient line.
    pub stalled_requests: u64,
}

/// The directory controller with its L2-sized tag array and main memory.
#[derive(Debug)]
pub struct Directory {
    protocol: Protocol,
    latency: u64,
    array: CacheArray<DirLine>,
    memory: Box<dyn MemoryController>,
    /// Counters.
    pub stats: DirectoryStats,
}

impl Directory {
    /// Builds the directory from a validated configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_memory(config, controller::build(&config.memory))
    }

    /// Builds the directory in front of an explicit memory controller.
    pub fn with_memory(config: &Config, memory: Box<dyn MemoryController>) -> Self {
        Self {
            protocol: config.protocol,
            latency: config.cache.l2.latency,
            array: CacheArray::new(&config.cache.l2),
            memory,
            stats: DirectoryStats::default(),
        }
    }

    /// Directory state of `tag` (`I` when untracked).
    pub fn state_of(&self, tag: u64) -> DirState {
        self.entry(tag).map_or(DirState::I, |line| line.state)
    }

    /// Owner of `tag`, if any.
    pub fn owner_of(&self, tag: u64) -> Option<usize> {
        self.entry(tag).and_then(|line| line.owner)
    }

    /// Sharers of `tag` in ascending order.
    pub fn sharers_of(&self, tag: u64) -> Vec<usize> {
        self.entry(tag)
            .map(|line| line.sharers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// True when the owner of `tag` asked for write permission and memory
    /// has not seen the data since.
    pub fn is_dirty(&self, tag: u64) -> bool {
        self.entry(tag).is_some_and(|line| line.dirty)
    }

    /// Tag under recall in the way holding `tag`, if a recall is running.
    pub fn victim_of(&self, tag: u64) -> Option<u64> {
        self.entry(tag).and_then(|line| line.victim)
    }

    /// Number of tracked lines.
    pub fn occupancy(&self) -> usize {
        self.array.iter().filter(|(_, line)| line.tag.is_some()).count()
    }

    fn entry(&self, tag: u64) -> Option<&DirLine> {
        self.array
            .find(tag)
            .and_then(|id| self.array.line(id))
            .map(|line| &line.state)
    }

    fn line_mut(&mut self, id: LineId, cycle: u64) -> SimResult<&mut DirLine> {
        self.array
            .line_mut(id)
            .map(|line| &mut line.state)
            .ok_or_else(|| SimError::UnknownTarget {
                what: format!("directory way {id:?}"),
                cycle,
            })
    }

    /// Checks the stable-state invariants of every tracked line.
    ///
    /// `M` lines have an owner and no sharers; `S` lines have at least one
    /// sharer, no owner and are clean.
    pub fn check_invariants(&self, cycle: u64) -> SimResult<()> {
        self.array
            .iter()
            .try_for_each(|(id, _)| self.check_line(id, cycle))
    }

    fn check_line(&self, id: LineId, cycle: u64) -> SimResult<()> {
        let Some(line) = self.array.line(id) else {
            return Ok(());
        };
        let entry = &line.state;
        let ok = match entry.state {
            DirState::M => entry.owner.is_some() && entry.sharers.is_empty(),
            DirState::S => entry.owner.is_none() && !entry.sharers.is_empty() && !entry.dirty,
            DirState::I => !entry.dirty,
            _ => true,
        };
        if ok {
            return Ok(());
        }
        Err(SimError::protocol(
            cycle,
            "dir",
            entry.state,
            format!(
                "invariant (tag {:#x?}, owner {:?}, sharers {:?}, dirty {})",
                line.tag, entry.owner, entry.sharers, entry.dirty
            ),
        ))
    }

    /// Handles a coherence message addressed to the directory.
    pub fn receive(&mut self, message: Message, fabric: &mut Fabric<'_>) -> SimResult<()> {
        match message.kind {
            MessageKind::GetS | MessageKind::GetM => {
                if !message.replayed {
                    if matches!(message.kind, MessageKind::GetS) {
                        self.stats.get_s += 1;
                    } else {
                        self.stats.get_m += 1;
                    }
                    if self.array.find(message.tag).is_some() {
                        self.stats.hits += 1;
                    } else {
                        self.stats.misses += 1;
                    }
                }
                self.request(message, fabric)
            }
            _ => {
                if matches!(message.kind, MessageKind::PutS | MessageKind::PutM { .. }) {
                    self.stats.puts += 1;
                }
                match self.array.find(message.tag) {
                    Some(id) => self.dispatch(id, message, fabric),
                    None if matches!(message.kind, MessageKind::PutS | MessageKind::PutM { .. }) => {
                        self.send(message.sender, MessageKind::PutAck, message.tag, 0, fabric);
                        Ok(())
                    }
                    None => Err(SimError::UnknownTarget {
                        what: format!("directory line {:#x} for {:?}", message.tag, message.kind),
                        cycle: fabric.now(),
                    }),
                }
            }
        }
    }

    /// Finds or allocates the line of a GetS/GetM.
    fn request(&mut self, message: Message, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let tag = message.tag;
        let set = self.array.set_of(tag);

        let making_room = self
            .array
            .set_lines(set)
            .find(|(_, line)| {
                matches!(line.state.state, DirState::MiA | DirState::SiA)
                    && line.state.evicter == Some(tag)
            })
            .map(|(id, _)| id);
        if let Some(id) = making_room {
            return self.stall(id, message, cycle);
        }

        if let Some(id) = self.array.find(tag) {
            self.array.touch(id);
            return self.dispatch(id, message, fabric);
        }

        let free = self
            .array
            .set_lines(set)
            .find(|(_, line)| line.tag.is_none())
            .map(|(id, _)| id);
        if let Some(id) = free {
            if let Some(slot) = self.array.line_mut(id) {
                slot.tag = Some(tag);
            }
            self.array.touch(id);
            return self.dispatch(id, message, fabric);
        }

        let id = self.array.victim(set);
        let victim_tag = self.array.line(id).and_then(|l| l.tag).unwrap_or_default();
        let line = self.line_mut(id, cycle)?;
        let recall_from: Vec<usize> = match line.state {
            DirState::S => line.sharers.iter().copied().collect(),
            DirState::M => line.owner.into_iter().collect(),
            _ => return self.stall(id, message, cycle),
        };
        line.state = if line.state == DirState::M {
            DirState::MiA
        } else {
            DirState::SiA
        };
        line.evicter = Some(tag);
        line.victim = Some(victim_tag);
        line.recall_acks = recall_from.len();
        line.recall_dirty = false;
        line.stalled.push(message);
        self.stats.recalls += 1;
        if !message.replayed {
            self.stats.stalled_requests += 1;
        }
        debug!(cycle, victim = victim_tag, incoming = tag, sharers = ?recall_from, "directory recall");
        for l1 in recall_from {
            self.send(NodeId::L1(l1), MessageKind::Recall, victim_tag, 0, fabric);
        }
        Ok(())
    }

    /// Runs the state machine on `id` and redelivers stalled messages if the
    /// line changed state.
    fn dispatch(&mut self, id: LineId, message: Message, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let before = self.line_mut(id, cycle)?.state;
        self.on_message(id, before, message, fabric)?;
        self.after_transition(id, before, fabric)
    }

    fn after_transition(&mut self, id: LineId, before: DirState, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let line = self.line_mut(id, cycle)?;
        if line.state != before && !line.stalled.is_empty() {
            for stalled in std::mem::take(&mut line.stalled) {
                fabric.replay(NodeId::Directory, stalled);
            }
        }
        self.check_line(id, cycle)
    }

    fn stall(&mut self, id: LineId, message: Message, cycle: u64) -> SimResult<()> {
        self.line_mut(id, cycle)?.stalled.push(message);
        if !message.replayed {
            self.stats.stalled_requests += 1;
        }
        Ok(())
    }

    /// Returns the line to `I` and frees its way.
    fn release(&mut self, id: LineId, cycle: u64) -> SimResult<()> {
        if let Some(slot) = self.array.line_mut(id) {
            slot.tag = None;
        }
        let line = self.line_mut(id, cycle)?;
        line.state = DirState::I;
        line.owner = None;
        line.sharers.clear();
        line.requester = None;
        line.evicter = None;
        line.victim = None;
        line.recall_acks = 0;
        line.recall_dirty = false;
        line.dirty = false;
        Ok(())
    }

    /// Writebacks are posted: nothing waits on them, so their memory time is
    /// only accounted.
    fn write_back(&mut self, tag: u64) {
        self.stats.writeback_cycles += self.memory.access_latency(tag);
        self.stats.memory_writes += 1;
    }

    fn send(&self, to: NodeId, kind: MessageKind, tag: u64, extra: u64, fabric: &mut Fabric<'_>) {
        let message = Message::new(kind, tag, NodeId::Directory);
        fabric.send(to, message, self.array.line_bytes(), extra);
    }
}
