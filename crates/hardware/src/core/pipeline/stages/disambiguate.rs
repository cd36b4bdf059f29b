//! Load/Store Queue Refresh.
//!
//! Memory disambiguation: decides which loads may be sent to memory. The queue
//! is walked in program order. A store address counts as resolved only from the
//! cycle after its base register was produced.
//!
//! 1. A store whose address is unresolved blocks every younger load.
//! 2. A store whose address is resolved but whose data is not produced blocks
//!    loads to its address.
//! 3. A store with all operands produced unblocks its address; the load will
//!    be forwarded from it at issue.
//! 4. A dispatched load with its base produced, not blocked, is admitted to the
//!    ready-load queue.

use crate::core::cpu::{Core, IssueQueues, QueueSlot};
use crate::core::pipeline::rob::EntryRef;
use crate::core::thread::{Thread, ThreadState};

/// Refreshes the LSQ of every running thread.
pub fn refresh_lsq_stage(core: &mut Core, cycle: u64) {
    for (t, thread) in core.threads.iter().enumerate() {
        if thread.state == ThreadState::Running {
            refresh_thread(t, thread, &mut core.queues, cycle);
        }
    }
}

/// Admits the eligible loads of one thread.
pub fn refresh_thread(t: usize, thread: &Thread, queues: &mut IssueQueues, cycle: u64) {
    let mut unknown: Vec<u32> = Vec::new();
    for (handle, entry) in thread.lsq.iter() {
        if entry.is_store {
            if !entry.address_resolved_at(cycle) {
                break;
            }
            if entry.all_operands_ready() || entry.status.completed {
                unknown.retain(|&a| a != entry.ea);
            } else {
                unknown.push(entry.ea);
            }
            continue;
        }

        let slot = QueueSlot {
            thread: t,
            entry: EntryRef::Lsq(handle),
        };
        let eligible = entry.status.dispatched
            && !entry.status.issued
            && !entry.status.completed
            && entry.all_operands_ready()
            && !unknown.contains(&entry.ea);
        if eligible && !queues.ready_loads.contains(&slot) {
            queues.ready_loads.push(slot);
        }
    }
}
