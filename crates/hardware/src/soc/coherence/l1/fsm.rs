//! Coherence message handling of an L1 line.
//!
//! Stable lines answer the directory through the [`mesi`] table. A line with a
//! transaction in flight either absorbs the message into its transient state
//! or stalls it; stalled messages are redelivered as soon as the line changes
//! state.
//!
//! | State | Data | InvAck | FwdGetS / FwdGetM | Inv | Recall | PutAck |
//! |---|---|---|---|---|---|---|
//! | IS_D | S or E | | stall | stall | stall | |
//! | IM_AD, SM_AD | M, or IM_A / SM_A while acks remain | count | stall | SM_AD: IM_AD | SM_AD: IM_AD | |
//! | IM_A, SM_A | | count, M at zero | stall | | stall | |
//! | MI_A | | | supply, SI_A / II_A | | II_A | I |
//! | SI_A | | | | II_A | II_A | I |
//! | II_A | | | | | | I |

use tracing::trace;

use super::{L1Controller, L1State};
use crate::common::{SimError, SimResult};
use crate::soc::cache::LineId;
use crate::soc::coherence::Fabric;
use crate::soc::coherence::lock::LockEvent;
use crate::soc::coherence::mesi::{self, Action, LineEvent, Stable};
use crate::soc::coherence::message::{Message, MessageKind, NodeId};

impl L1Controller {
    /// Handles a coherence message addressed to this controller.
    pub fn receive(&mut self, message: Message, fabric: &mut Fabric<'_>) -> SimResult<()> {
        let cycle = fabric.now();
        let Some(id) = self.array.find(message.tag) else {
            return Err(SimError::UnknownTarget {
                what: format!("{} line {:#x} for {:?}", self.name, message.tag, message.kind),
                cycle,
            });
        };

        let before = self.line_mut(id, cycle)?.state;
        trace!(cycle, l1 = %self.name, state = ?before, ?message, "receive");
        self.on_message(id, before, message, fabric)?;

        let node = NodeId::L1(self.id);
        let line = self.line_mut(id, cycle)?;
        if line.state != before && !line.stalled.is_empty() {
            for stalled in std::mem::take(&mut line.stalled) {
                fabric.replay(node, stalled);
            }
        }
        Ok(())
    }

    fn on_message(
        &mut self,
        id: LineId,
        state: L1State,
        message: Message,
        fabric: &mut Fabric<'_>,
    ) -> SimResult<()> {
        use L1State::{E, IiA, ImA, ImAd, IsD, M, MiA, S, SiA, SmA, SmAd};
        use MessageKind::{Data, FwdGetM, FwdGetS, Inv, InvAck, PutAck, Recall};

        let cycle = fabric.now();
        let protocol = self.protocol;
        let from_owner = message.sender_l1().is_some();

        match (state, message.kind) {
            (IsD, Data { exclusive, .. }) => {
                let sharers = from_owner || !exclusive;
                let (next, _) = mesi::transition(
                    protocol,
                    Stable::I,
                    LineEvent::Read { sharers },
                    cycle,
                    &self.name,
                )?;
                self.line_mut(id, cycle)?.state = L1State::from_stable(next);
                self.finish_transaction(id, fabric)
            }
            (ImAd | SmAd, Data { acks, .. }) => {
                let line = self.line_mut(id, cycle)?;
                line.pending_acks += acks;
                if from_owner || line.pending_acks == 0 {
                    line.state = M;
                    self.finish_transaction(id, fabric)
                } else {
                    line.state = if state == ImAd { ImA } else { SmA };
                    Ok(())
                }
            }
            (ImAd | SmAd, InvAck) => {
                self.line_mut(id, cycle)?.pending_acks -= 1;
                Ok(())
            }
            (ImA | SmA, InvAck) => {
                let line = self.line_mut(id, cycle)?;
                line.pending_acks -= 1;
                if line.pending_acks == 0 {
                    line.state = M;
                    self.finish_transaction(id, fabric)
                } else {
                    Ok(())
                }
            }
            (SmAd, Inv { requester }) => {
                self.send_to(NodeId::L1(requester), InvAck, message.tag, fabric);
                self.line_mut(id, cycle)?.state = ImAd;
                self.set_lock(id, LockEvent::Invalidate, cycle)
            }
            (SmAd, Recall) => {
                self.send_to(NodeId::Directory, MessageKind::RecallAck { dirty: false }, message.tag, fabric);
                self.line_mut(id, cycle)?.state = ImAd;
                self.set_lock(id, LockEvent::Invalidate, cycle)
            }
            (IsD | ImAd | ImA | SmAd | SmA, FwdGetS { .. } | FwdGetM { .. } | Inv { .. } | Recall) => {
                self.line_mut(id, cycle)?.stalled.push(message);
                self.stats.stalled_messages += 1;
                Ok(())
            }

            (S, Inv { requester }) => {
                let (_, actions) = mesi::transition(
                    protocol,
                    Stable::S,
                    LineEvent::ExternalWrite,
                    cycle,
                    &self.name,
                )?;
                if actions.contains(&Action::Ack) {
                    self.send_to(NodeId::L1(requester), InvAck, message.tag, fabric);
                }
                self.invalidate(id, cycle)
            }
            (E | M, FwdGetS { requester }) => {
                let current = if state == M { Stable::M } else { Stable::E };
                let (next, actions) = mesi::transition(
                    protocol,
                    current,
                    LineEvent::ExternalRead,
                    cycle,
                    &self.name,
                )?;
                if actions.contains(&Action::PeerTransfer) {
                    self.supply(requester, message.tag, fabric);
                }
                let dirty = actions.contains(&Action::CopyBack);
                self.send_to(NodeId::Directory, MessageKind::CopyBack { dirty }, message.tag, fabric);
                let line = self.line_mut(id, cycle)?;
                line.state = L1State::from_stable(next);
                line.dirty = false;
                Ok(())
            }
            (E | M, FwdGetM { requester }) => {
                let current = if state == M { Stable::M } else { Stable::E };
                let (_, actions) = mesi::transition(
                    protocol,
                    current,
                    LineEvent::ExternalWrite,
                    cycle,
                    &self.name,
                )?;
                if actions.contains(&Action::PeerTransfer) {
                    self.supply(requester, message.tag, fabric);
                }
                self.invalidate(id, cycle)
            }
            (S | E | M, Recall) => {
                let current = state.stable().unwrap_or(Stable::I);
                let (_, actions) = mesi::transition(
                    protocol,
                    current,
                    LineEvent::Replacement,
                    cycle,
                    &self.name,
                )?;
                let dirty = actions.contains(&Action::WriteBack);
                self.send_to(NodeId::Directory, MessageKind::RecallAck { dirty }, message.tag, fabric);
                self.invalidate(id, cycle)
            }

            (MiA, FwdGetS { requester }) => {
                self.supply(requester, message.tag, fabric);
                let dirty = self.line_mut(id, cycle)?.dirty;
                self.send_to(NodeId::Directory, MessageKind::CopyBack { dirty }, message.tag, fabric);
                self.line_mut(id, cycle)?.state = SiA;
                Ok(())
            }
            (MiA, FwdGetM { requester }) => {
                self.supply(requester, message.tag, fabric);
                self.line_mut(id, cycle)?.state = IiA;
                Ok(())
            }
            (MiA | SiA, Recall) => {
                let dirty = state == MiA && self.line_mut(id, cycle)?.dirty;
                self.send_to(NodeId::Directory, MessageKind::RecallAck { dirty }, message.tag, fabric);
                self.line_mut(id, cycle)?.state = IiA;
                Ok(())
            }
            (SiA, Inv { requester }) => {
                self.send_to(NodeId::L1(requester), InvAck, message.tag, fabric);
                self.line_mut(id, cycle)?.state = IiA;
                Ok(())
            }
            (MiA | SiA | IiA, PutAck) => self.finish_eviction(id, fabric),

            _ => Err(SimError::protocol(cycle, self.name.clone(), state, message.kind)),
        }
    }

    /// Drops the line after the directory took it away.
    fn invalidate(&mut self, id: LineId, cycle: u64) -> SimResult<()> {
        self.set_lock(id, LockEvent::Invalidate, cycle)?;
        if let Some(slot) = self.array.line_mut(id) {
            slot.tag = None;
        }
        let line = self.line_mut(id, cycle)?;
        line.state = L1State::I;
        line.dirty = false;
        self.stats.invalidations += 1;
        Ok(())
    }

    fn supply(&mut self, requester: usize, tag: u64, fabric: &mut Fabric<'_>) {
        let data = MessageKind::Data {
            acks: 0,
            exclusive: false,
        };
        self.send_to(NodeId::L1(requester), data, tag, fabric);
    }

    fn send_to(&self, to: NodeId, kind: MessageKind, tag: u64, fabric: &mut Fabric<'_>) {
        let message = Message::new(kind, tag, NodeId::L1(self.id));
        fabric.send(to, message, self.array.line_bytes(), 0);
    }
}
