//! Directory state machine.
//!
//! Requests that reach a line in a transient state (`IS_D`, `IM_D`, `S_D`,
//! `MI_A`, `SI_A`) stall on it and are redelivered when it changes state.
//! Puts from caches the directory no longer tracks are acknowledged and
//! otherwise ignored.

use super::{DirState, Directory};
use crate::common::constants::CONTROL_MESSAGE_SIZE;
use crate::common::{SimError, SimResult};
use crate::config::Protocol;
use crate::sim::event::{Event, MemoryEvent};
use crate::soc::cache::LineId;
use crate::soc::coherence::Fabric;
use crate::soc::coherence::message::{Message, MessageKind, NodeId};

impl Directory {
    pub(super) fn on_message(
        &mut self,
        id: LineId,
        state: DirState,
        message: Message,
        fabric: &mut Fabric<'_>,
    ) -> SimResult<()> {
        use DirState::{I, ImD, IsD, M, MiA, S, SD, SiA};
        use MessageKind::{CopyBack, GetM, GetS, PutAck, PutM, PutS, RecallAck};

        let cycle = fabric.now();
        let tag = message.tag;
        let violation = || SimError::protocol(cycle, "dir", state, message.kind);
        let sender = message.sender_l1();
        let owner = self.line_mut(id, cycle)?.owner;

        match (state, message.kind) {
            (I, GetS | GetM) => {
                let requester = sender.ok_or_else(violation)?;
                let line = self.line_mut(id, cycle)?;
                line.requester = Some(requester);
                line.state = if matches!(message.kind, GetS) { IsD } else { ImD };
                let delay = fabric.network.latency(CONTROL_MESSAGE_SIZE)
                    + self.memory.access_latency(tag)
                    + self.latency;
                fabric
                    .events
                    .schedule(Event::Memory(MemoryEvent::MemoryData { tag }), delay);
                self.stats.memory_reads += 1;
                Ok(())
            }
            (IsD | ImD | SD | MiA | SiA, GetS | GetM) => self.stall(id, message, cycle),

            (S, GetS) => {
                let requester = sender.ok_or_else(violation)?;
                let data = MessageKind::Data {
                    acks: 0,
                    exclusive: false,
                };
                self.send(NodeId::L1(requester), data, tag, self.latency, fabric);
                let _ = self.line_mut(id, cycle)?.sharers.insert(requester);
                Ok(())
            }
            (S, GetM) => {
                let requester = sender.ok_or_else(violation)?;
                let line = self.line_mut(id, cycle)?;
                let others: Vec<usize> = line
                    .sharers
                    .iter()
                    .copied()
                    .filter(|&l1| l1 != requester)
                    .collect();
                line.sharers.clear();
                line.owner = Some(requester);
                line.state = M;
                line.dirty = true;
                let data = MessageKind::Data {
                    acks: others.len() as i64,
                    exclusive: false,
                };
                self.send(NodeId::L1(requester), data, tag, self.latency, fabric);
                for l1 in others {
                    self.send(NodeId::L1(l1), MessageKind::Inv { requester }, tag, 0, fabric);
                }
                Ok(())
            }
            (M, GetS) => {
                let requester = sender.ok_or_else(violation)?;
                let line = self.line_mut(id, cycle)?;
                let owner = line.owner.take().ok_or_else(violation)?;
                line.sharers = [requester, owner].into_iter().collect();
                line.state = SD;
                self.send(NodeId::L1(owner), MessageKind::FwdGetS { requester }, tag, 0, fabric);
                Ok(())
            }
            (M, GetM) => {
                let requester = sender.ok_or_else(violation)?;
                let line = self.line_mut(id, cycle)?;
                let owner = line.owner.replace(requester).ok_or_else(violation)?;
                line.dirty = true;
                self.send(NodeId::L1(owner), MessageKind::FwdGetM { requester }, tag, 0, fabric);
                Ok(())
            }

            (SD, CopyBack { dirty }) => {
                if dirty {
                    self.write_back(tag);
                }
                let line = self.line_mut(id, cycle)?;
                line.dirty = false;
                if line.sharers.is_empty() {
                    self.release(id, cycle)
                } else {
                    line.state = S;
                    Ok(())
                }
            }

            (S | SD, PutS | PutM { .. }) => {
                let l1 = sender.ok_or_else(violation)?;
                let line = self.line_mut(id, cycle)?;
                let _ = line.sharers.remove(&l1);
                let empty = line.sharers.is_empty();
                self.send(message.sender, PutAck, tag, 0, fabric);
                if state == S && empty {
                    self.release(id, cycle)?;
                }
                Ok(())
            }
            (M, PutM { dirty }) if owner.is_some() && owner == sender => {
                if dirty {
                    self.write_back(tag);
                }
                self.send(message.sender, PutAck, tag, 0, fabric);
                self.release(id, cycle)
            }
            (M | IsD | ImD | MiA | SiA, PutS | PutM { .. }) => {
                self.send(message.sender, PutAck, tag, 0, fabric);
                Ok(())
            }

            (MiA | SiA, RecallAck { dirty }) => {
                let line = self.line_mut(id, cycle)?;
                if line.victim != Some(tag) {
                    return Err(violation());
                }
                line.recall_acks = line.recall_acks.saturating_sub(1);
                line.recall_dirty |= dirty;
                if line.recall_acks == 0 {
                    if line.recall_dirty {
                        self.write_back(tag);
                    }
                    self.release(id, cycle)?;
                }
                Ok(())
            }

            _ => Err(violation()),
        }
    }

    /// Main memory returned `tag`.
    pub fn memory_data(&mut self, tag: u64, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let Some(id) = self.array.find(tag) else {
            return Err(SimError::UnknownTarget {
                what: format!("directory line {tag:#x} for memory data"),
                cycle,
            });
        };
        let protocol = self.protocol;
        let line = self.line_mut(id, cycle)?;
        let state = line.state;
        let requester = line
            .requester
            .take()
            .ok_or_else(|| SimError::protocol(cycle, "dir", state, "MemoryData"))?;

        let exclusive = match state {
            DirState::IsD if protocol == Protocol::Msi => {
                let _ = line.sharers.insert(requester);
                line.state = DirState::S;
                false
            }
            DirState::IsD => {
                line.owner = Some(requester);
                line.state = DirState::M;
                true
            }
            DirState::ImD => {
                line.owner = Some(requester);
                line.state = DirState::M;
                line.dirty = true;
                false
            }
            _ => return Err(SimError::protocol(cycle, "dir", state, "MemoryData")),
        };
        let data = MessageKind::Data { acks: 0, exclusive };
        self.send(NodeId::L1(requester), data, tag, 0, fabric);
        self.after_transition(id, state, fabric)
    }
}
