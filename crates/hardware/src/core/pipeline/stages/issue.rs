//! Wakeup and Issue Stages.
//!
//! Wakeup moves entries whose operands are now produced from the waiting
//! queues to the ready queues. Issue then spends one shared quantum of
//! `issue_width` slots on, in order:
//! 1. **Instructions:** Each needs a functional unit; one without an operation
//!    completes immediately.
//! 2. **Loads:** Forwarded from an older store to the same address, or sent to
//!    the L1 data cache. A refused load ends load issue for the cycle.
//! 3. **Stores:** Sent to the L1 data cache and completed at once. A refused
//!    store ends store issue for the cycle.

use tracing::trace;

use crate::common::Handle;
use crate::core::cpu::{Core, QueueSlot};
use crate::core::pipeline::rob::EntryRef;
use crate::core::pipeline::stages::writeback::write_back_targets;
use crate::core::thread::Thread;
use crate::sim::SimContext;
use crate::sim::event::{AccessTarget, AccessToken, CoreEvent, Event};

/// Moves woken entries from the waiting queues to the ready queues.
pub fn wakeup_stage(core: &mut Core) {
    let Core {
        threads, queues, ..
    } = core;

    let mut still_waiting = Vec::with_capacity(queues.waiting_instructions.len());
    for slot in queues.waiting_instructions.drain(..) {
        let ready = match slot.entry {
            EntryRef::Rob(h) => threads
                .get(slot.thread)
                .and_then(|t| t.rob.get(h))
                .map(|e| e.all_operands_ready()),
            EntryRef::Lsq(_) => None,
        };
        match ready {
            Some(true) => queues.ready_instructions.push(slot),
            Some(false) => still_waiting.push(slot),
            None => {}
        }
    }
    queues.waiting_instructions = still_waiting;

    let mut still_waiting = Vec::with_capacity(queues.waiting_stores.len());
    for slot in queues.waiting_stores.drain(..) {
        let ready = match slot.entry {
            EntryRef::Lsq(h) => threads
                .get(slot.thread)
                .and_then(|t| t.lsq.get(h))
                .map(|e| e.all_operands_ready()),
            EntryRef::Rob(_) => None,
        };
        match ready {
            Some(true) => queues.ready_stores.push(slot),
            Some(false) => still_waiting.push(slot),
            None => {}
        }
    }
    queues.waiting_stores = still_waiting;
}

/// Issues from the ready instruction, load and store queues.
pub fn issue_stage(core: &mut Core, sim: &mut SimContext<'_>) {
    let mut quantum = core.issue_width;
    issue_instructions(core, sim, &mut quantum);
    issue_loads(core, sim, &mut quantum);
    issue_stores(core, sim, &mut quantum);
}

fn issue_instructions(core: &mut Core, sim: &mut SimContext<'_>, quantum: &mut usize) {
    let ready = std::mem::take(&mut core.queues.ready_instructions);
    let mut remaining = Vec::with_capacity(ready.len());
    for slot in ready {
        if *quantum == 0 {
            remaining.push(slot);
            continue;
        }
        let EntryRef::Rob(h) = slot.entry else {
            continue;
        };
        let Some(thread) = core.threads.get_mut(slot.thread) else {
            continue;
        };
        let Some(entry) = thread.rob.get_mut(h) else {
            continue;
        };

        if let Some(op) = entry.inst.inst.mnemonic.fu_op {
            let Some(grant) = core.fu.acquire(op) else {
                thread.stats.issue_stalls_no_free_fu += 1;
                remaining.push(slot);
                continue;
            };
            entry.status.issued = true;
            let core_id = core.id;
            sim.events.schedule(
                Event::Core {
                    core: core_id,
                    event: CoreEvent::FuReleased {
                        kind: grant.kind,
                        epoch: grant.epoch,
                    },
                },
                grant.issue_latency,
            );
            sim.events.schedule(
                Event::Core {
                    core: core_id,
                    event: CoreEvent::OperationComplete {
                        thread: slot.thread,
                        entry: slot.entry,
                    },
                },
                grant.operation_latency,
            );
        } else {
            entry.status.issued = true;
            entry.status.completed = true;
            let plain = !entry.kind.is_memory();
            let targets: Vec<_> = entry.targets.iter().map(|m| m.new).collect();
            if plain {
                write_back_targets(thread, &mut core.regs, &targets, sim.cycle());
            }
        }
        core.stats.issued += 1;
        *quantum -= 1;
    }
    core.queues.ready_instructions = remaining;
}

/// Returns true if an older store in `thread`'s LSQ writes `ea`.
fn older_store_hit(thread: &Thread, load: Handle, ea: u32) -> bool {
    thread
        .lsq
        .iter()
        .take_while(|&(h, _)| h != load)
        .any(|(_, e)| e.is_store && e.ea == ea)
}

fn issue_loads(core: &mut Core, sim: &mut SimContext<'_>, quantum: &mut usize) {
    let ready = std::mem::take(&mut core.queues.ready_loads);
    let mut remaining = Vec::new();
    let mut blocked = false;
    for slot in ready {
        if *quantum == 0 || blocked {
            remaining.push(slot);
            continue;
        }
        let EntryRef::Lsq(h) = slot.entry else {
            continue;
        };
        let Some(thread) = core.threads.get_mut(slot.thread) else {
            continue;
        };
        let Some(ea) = thread.lsq.get(h).map(|e| e.ea) else {
            continue;
        };

        if older_store_hit(thread, h, ea) {
            thread.stats.forwarded_loads += 1;
            if let Some(e) = thread.lsq.get_mut(h) {
                e.status.issued = true;
            }
            core.completed.push(slot);
        } else {
            if !sim.memory.can_load(core.id, ea) {
                thread.stats.issue_stalls_cannot_load += 1;
                remaining.push(slot);
                blocked = true;
                continue;
            }
            let token = AccessToken {
                core: core.id,
                thread: slot.thread,
                target: AccessTarget::Lsq(h),
            };
            sim.memory.load(core.id, ea, token, sim.events);
            thread.outstanding_accesses += 1;
            if let Some(e) = thread.lsq.get_mut(h) {
                e.status.issued = true;
                e.in_flight = true;
            }
            trace!(thread = %thread.name, ea, "load issued");
        }
        core.stats.issued += 1;
        *quantum -= 1;
    }
    core.queues.ready_loads = remaining;
}

fn issue_stores(core: &mut Core, sim: &mut SimContext<'_>, quantum: &mut usize) {
    let ready = std::mem::take(&mut core.queues.ready_stores);
    let mut remaining = Vec::new();
    let mut blocked = false;
    for slot in ready {
        if *quantum == 0 || blocked {
            remaining.push(slot);
            continue;
        }
        let EntryRef::Lsq(h) = slot.entry else {
            continue;
        };
        let Some(thread) = core.threads.get_mut(slot.thread) else {
            continue;
        };
        let Some(ea) = thread.lsq.get(h).map(|e| e.ea) else {
            continue;
        };
        if !sim.memory.can_store(core.id, ea) {
            thread.stats.issue_stalls_cannot_store += 1;
            remaining.push(slot);
            blocked = true;
            continue;
        }
        let token = AccessToken {
            core: core.id,
            thread: slot.thread,
            target: AccessTarget::Lsq(h),
        };
        sim.memory.store(core.id, ea, token, sim.events);
        thread.outstanding_accesses += 1;
        if let Some(e) = thread.lsq.get_mut(h) {
            e.status.issued = true;
            e.in_flight = true;
        }
        core.completed.push(QueueSlot {
            thread: slot.thread,
            entry: slot.entry,
        });
        core.stats.issued += 1;
        *quantum -= 1;
    }
    core.queues.ready_stores = remaining;
}
