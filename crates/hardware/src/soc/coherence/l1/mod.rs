//! L1 cache controller.
//!
//! The pipeline submits accesses with [`L1Controller::can_access`] and
//! [`L1Controller::begin_access`]. An access to a tag that already has a
//! pending read is merged into it as an alias and completes with it. After the
//! hit latency the hierarchy calls [`L1Controller::access`], which locks the
//! target line for a hit, an eviction followed by a fill, or a fill. Accesses
//! that find their line locked are parked on it and replayed once it unlocks.

/// Coherence message handling and transient states.
pub mod fsm;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::Fabric;
use super::lock::{LockEvent, LockState};
use super::mesi::{self, Action, LineEvent, Stable};
use super::message::{Message, MessageKind, NodeId};
use crate::common::{AccessType, SimError, SimResult};
use crate::config::{CacheConfig, Protocol};
use crate::sim::event::AccessToken;
use crate::soc::cache::{CacheArray, LineId};

/// Coherence state of an L1 line, stable and transient.
///
/// Transient names follow the usual `XY_Z` convention: moving from `X` to `Y`,
/// waiting for `A`cknowledgements and/or `D`ata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum L1State {
    /// Invalid.
    #[default]
    I,
    /// Shared.
    S,
    /// Exclusive (clean, MESI only).
    E,
    /// Modified.
    M,
    /// Read miss, waiting for data.
    IsD,
    /// Write miss, waiting for data and acks.
    ImAd,
    /// Write miss, data received, waiting for acks.
    ImA,
    /// Upgrade from Shared, waiting for data and acks.
    SmAd,
    /// Upgrade from Shared, data received, waiting for acks.
    SmA,
    /// Evicting an owned line, waiting for PutAck.
    MiA,
    /// Evicting a shared line, waiting for PutAck.
    SiA,
    /// Eviction overtaken by an invalidation, waiting for PutAck.
    IiA,
}

impl L1State {
    /// The stable state, or `None` while a transaction is in flight.
    pub const fn stable(self) -> Option<Stable> {
        match self {
            Self::I => Some(Stable::I),
            Self::S => Some(Stable::S),
            Self::E => Some(Stable::E),
            Self::M => Some(Stable::M),
            _ => None,
        }
    }

    const fn from_stable(stable: Stable) -> Self {
        match stable {
            Stable::I => Self::I,
            Stable::S => Self::S,
            Stable::E => Self::E,
            Stable::M => Self::M,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Transaction {
    Fill,
    Upgrade,
    /// Evicting to make room for `tag`.
    Evict { kind: AccessType, tag: u64 },
}

/// One way of the L1 array.
#[derive(Debug, Default)]
pub struct L1Line {
    state: L1State,
    lock: LockState,
    dirty: bool,
    pending_acks: i64,
    txn: Option<Transaction>,
    suspended: Vec<(AccessType, u64)>,
    stalled: Vec<Message>,
}

#[derive(Debug)]
struct PendingAccess {
    kind: AccessType,
    tokens: Vec<AccessToken>,
}

/// Per-controller counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct L1Stats {
    /// Reads and fetches that found the line readable.
    pub read_hits: u64,
    /// Reads and fetches that required a fill.
    pub read_misses: u64,
    /// Writes that found the line writable.
    pub write_hits: u64,
    /// Writes that required a fill or upgrade.
    pub write_misses: u64,
    /// Lines evicted to make room.
    pub evictions: u64,
    /// Lines invalidated or recalled by the directory.
    pub invalidations: u64,
    /// Accesses parked on a locked line.
    pub lock_conflicts: u64,
    /// Coherence messages stalled by a transient state.
    pub stalled_messages: u64,
}

/// Private cache controller of one core (instruction or data side).
#[derive(Debug)]
pub struct L1Controller {
    id: usize,
    name: String,
    protocol: Protocol,
    latency: u64,
    read_ports: usize,
    write_ports: usize,
    array: CacheArray<L1Line>,
    pending: HashMap<u64, PendingAccess>,
    pending_per_kind: [usize; 3],
    /// Counters.
    pub stats: L1Stats,
}

const fn kind_index(kind: AccessType) -> usize {
    match kind {
        AccessType::Fetch => 0,
        AccessType::Read => 1,
        AccessType::Write => 2,
    }
}

impl L1Controller {
    /// Creates controller `id` named `name` over a validated cache configuration.
    pub fn new(id: usize, name: impl Into<String>, config: &CacheConfig, protocol: Protocol) -> Self {
        Self {
            id,
            name: name.into(),
            protocol,
            latency: config.latency,
            read_ports: config.read_ports,
            write_ports: config.write_ports,
            array: CacheArray::new(config),
            pending: HashMap::new(),
            pending_per_kind: [0; 3],
            stats: L1Stats::default(),
        }
    }

    /// Controller id on the coherence network.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Display name (`l1d0`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hit latency in cycles.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Line size in bytes.
    pub const fn line_bytes(&self) -> u64 {
        self.array.line_bytes()
    }

    /// Line-aligned tag of `addr`.
    pub const fn tag_of(&self, addr: u64) -> u64 {
        self.array.tag_of(addr)
    }

    const fn node(&self) -> NodeId {
        NodeId::L1(self.id)
    }

    /// Returns true if an access of `kind` to `tag` may begin this cycle.
    ///
    /// A tag with a pending access accepts further reads as aliases; writes
    /// never merge. A new tag needs a free read or write port.
    pub fn can_access(&self, kind: AccessType, tag: u64) -> bool {
        match self.pending.get(&tag) {
            Some(pending) => !kind.is_write() && !pending.kind.is_write(),
            None => {
                let ports = if kind.is_write() {
                    self.write_ports
                } else {
                    self.read_ports
                };
                self.pending_per_kind[kind_index(kind)] < ports
            }
        }
    }

    /// Records an access. Returns true if it is a new primary access that the
    /// caller must schedule, false if it was merged as an alias.
    pub fn begin_access(&mut self, kind: AccessType, tag: u64, token: AccessToken) -> bool {
        if let Some(pending) = self.pending.get_mut(&tag) {
            pending.tokens.push(token);
            return false;
        }
        let _ = self.pending.insert(
            tag,
            PendingAccess {
                kind,
                tokens: vec![token],
            },
        );
        self.pending_per_kind[kind_index(kind)] += 1;
        true
    }

    /// Completes the pending access to `tag` and its aliases.
    pub fn end_access(&mut self, tag: u64) -> Vec<AccessToken> {
        match self.pending.remove(&tag) {
            Some(pending) => {
                let slot = &mut self.pending_per_kind[kind_index(pending.kind)];
                *slot = slot.saturating_sub(1);
                pending.tokens
            }
            None => Vec::new(),
        }
    }

    /// Number of accesses (primaries) in flight.
    pub fn pending_accesses(&self) -> usize {
        self.pending.len()
    }

    /// Coherence state of `tag` (`I` when absent).
    pub fn state_of(&self, tag: u64) -> L1State {
        self.line_of(tag).map_or(L1State::I, |line| line.state)
    }

    /// Lock state of the line holding `tag` (`Invalid` when absent).
    pub fn lock_of(&self, tag: u64) -> LockState {
        self.line_of(tag).map_or(LockState::Invalid, |line| line.lock)
    }

    /// Number of ways holding a line.
    pub fn occupancy(&self) -> usize {
        self.array.iter().filter(|(_, line)| line.tag.is_some()).count()
    }

    /// Total number of ways.
    pub const fn capacity(&self) -> usize {
        self.array.sets() * self.array.ways()
    }

    fn line_of(&self, tag: u64) -> Option<&L1Line> {
        self.array
            .find(tag)
            .and_then(|id| self.array.line(id))
            .map(|line| &line.state)
    }

    fn line_mut(&mut self, id: LineId, cycle: u64) -> SimResult<&mut L1Line> {
        let name = &self.name;
        self.array
            .line_mut(id)
            .map(|line| &mut line.state)
            .ok_or_else(|| SimError::UnknownTarget {
                what: format!("{name} way {id:?}"),
                cycle,
            })
    }

    fn set_lock(&mut self, id: LineId, event: LockEvent, cycle: u64) -> SimResult<()> {
        let name = self.name.clone();
        let line = self.line_mut(id, cycle)?;
        line.lock = line.lock.apply(event, cycle, &name)?;
        Ok(())
    }

    /// Services an access whose hit latency has elapsed.
    pub fn access(&mut self, kind: AccessType, tag: u64, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();

        if let Some(id) = self.array.find(tag) {
            let protocol = self.protocol;
            let name = self.name.clone();
            let line = self.line_mut(id, cycle)?;
            if line.lock.is_locked() {
                line.suspended.push((kind, tag));
                self.stats.lock_conflicts += 1;
                return Ok(());
            }
            let Some(stable) = line.state.stable() else {
                return Err(SimError::protocol(cycle, name, line.state, kind));
            };

            if stable == Stable::S && kind.is_write() {
                self.stats.write_misses += 1;
                self.set_lock(id, LockEvent::BeginHit, cycle)?;
                let line = self.line_mut(id, cycle)?;
                line.state = L1State::SmAd;
                line.txn = Some(Transaction::Upgrade);
                line.pending_acks = 0;
                let line_bytes = self.line_bytes();
                fabric.send(
                    NodeId::Directory,
                    Message::new(MessageKind::GetM, tag, self.node()),
                    line_bytes,
                    0,
                );
                return Ok(());
            }

            let event = if kind.is_write() {
                LineEvent::Write
            } else {
                LineEvent::Read { sharers: true }
            };
            let (next, _) = mesi::transition(protocol, stable, event, cycle, &name)?;
            self.set_lock(id, LockEvent::BeginHit, cycle)?;
            let line = self.line_mut(id, cycle)?;
            line.state = L1State::from_stable(next);
            line.dirty |= kind.is_write();
            self.set_lock(id, LockEvent::EndHit, cycle)?;
            self.array.touch(id);
            if kind.is_write() {
                self.stats.write_hits += 1;
            } else {
                self.stats.read_hits += 1;
            }
            self.complete(tag, fabric);
            return Ok(());
        }

        let set = self.array.set_of(tag);
        let free = self
            .array
            .set_lines(set)
            .find(|(_, line)| line.tag.is_none() && !line.state.lock.is_locked())
            .map(|(id, _)| id);
        let id = match free {
            Some(id) => id,
            None => self.array.victim(set),
        };

        let line = self.line_mut(id, cycle)?;
        if line.lock.is_locked() {
            line.suspended.push((kind, tag));
            self.stats.lock_conflicts += 1;
            return Ok(());
        }
        let lock = line.lock;
        match lock {
            LockState::Invalid => self.begin_fill(id, kind, tag, fabric),
            _ => self.begin_eviction(id, kind, tag, fabric),
        }
    }

    fn begin_fill(
        &mut self,
        id: LineId,
        kind: AccessType,
        tag: u64,
        fabric: &mut Fabric<'_>,
    ) -> SimResult<()> {
        let cycle = fabric.now();
        if kind.is_write() {
            self.stats.write_misses += 1;
        } else {
            self.stats.read_misses += 1;
        }
        self.set_lock(id, LockEvent::BeginFill, cycle)?;
        if let Some(slot) = self.array.line_mut(id) {
            slot.tag = Some(tag);
        }
        let line = self.line_mut(id, cycle)?;
        line.txn = Some(Transaction::Fill);
        line.pending_acks = 0;
        line.dirty = false;
        let request = if kind.is_write() {
            line.state = L1State::ImAd;
            MessageKind::GetM
        } else {
            line.state = L1State::IsD;
            MessageKind::GetS
        };
        let line_bytes = self.line_bytes();
        fabric.send(
            NodeId::Directory,
            Message::new(request, tag, self.node()),
            line_bytes,
            0,
        );
        Ok(())
    }

    fn begin_eviction(
        &mut self,
        id: LineId,
        kind: AccessType,
        tag: u64,
        fabric: &mut Fabric<'_>,
    ) -> SimResult<()> {
        let cycle = fabric.now();
        let protocol = self.protocol;
        let name = self.name.clone();
        let victim_tag = self.array.line(id).and_then(|l| l.tag).unwrap_or_default();
        let line = self.line_mut(id, cycle)?;
        let Some(stable) = line.state.stable() else {
            return Err(SimError::protocol(cycle, name, line.state, LockEvent::BeginEvict));
        };
        let (_, actions) = mesi::transition(protocol, stable, LineEvent::Replacement, cycle, &name)?;
        let (request, next) = if actions.contains(&Action::WriteBack) {
            (MessageKind::PutM { dirty: true }, L1State::MiA)
        } else if stable == Stable::E {
            (MessageKind::PutM { dirty: false }, L1State::MiA)
        } else {
            (MessageKind::PutS, L1State::SiA)
        };
        line.state = next;
        line.txn = Some(Transaction::Evict { kind, tag });
        self.set_lock(id, LockEvent::BeginEvict, cycle)?;
        self.stats.evictions += 1;
        debug!(cycle, l1 = %self.name, victim = victim_tag, incoming = tag, "evict");
        let line_bytes = self.line_bytes();
        fabric.send(
            NodeId::Directory,
            Message::new(request, victim_tag, self.node()),
            line_bytes,
            0,
        );
        Ok(())
    }

    /// Ends the fill or upgrade running on `id`, completes its access and
    /// replays accesses parked on the line.
    fn finish_transaction(&mut self, id: LineId, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let line = self.line_mut(id, cycle)?;
        let unlock = match line.lock {
            LockState::Hitting => LockEvent::EndHit,
            _ => LockEvent::EndFill,
        };
        line.txn = None;
        line.pending_acks = 0;
        if line.state == L1State::M {
            line.dirty = true;
        }
        self.set_lock(id, unlock, cycle)?;
        self.array.touch(id);
        if let Some(tag) = self.array.line(id).and_then(|l| l.tag) {
            self.complete(tag, fabric);
        }
        self.replay_suspended(id, fabric, cycle)
    }

    /// Ends the eviction running on `id` and starts the fill it made room for.
    fn finish_eviction(&mut self, id: LineId, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let name = self.name.clone();
        if let Some(slot) = self.array.line_mut(id) {
            slot.tag = None;
        }
        let line = self.line_mut(id, cycle)?;
        line.state = L1State::I;
        line.dirty = false;
        let txn = line.txn.take();
        self.set_lock(id, LockEvent::EndEvict, cycle)?;
        match txn {
            Some(Transaction::Evict { kind, tag }) => self.begin_fill(id, kind, tag, fabric),
            other => Err(SimError::protocol(cycle, name, L1State::I, other)),
        }
    }

    fn replay_suspended(&mut self, id: LineId, fabric: &mut Fabric<'_>, cycle: u64) -> SimResult<()> {
        let suspended = std::mem::take(&mut self.line_mut(id, cycle)?.suspended);
        for (kind, tag) in suspended {
            fabric.access(self.id, kind, tag, 0);
        }
        Ok(())
    }

    fn complete(&mut self, tag: u64, fabric: &mut Fabric<'_>) {
        let tokens = self.end_access(tag);
        fabric.complete(self.id, tag, tokens);
    }
}
