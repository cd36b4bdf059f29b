//! Dispatch Stage.
//!
//! Places renamed entries into the core's issue queues, oldest first within a
//! thread and round-robin across threads. Each ROB entry is dispatched exactly
//! once; a store's LSQ entry is dispatched with it into the store queues. Load
//! LSQ entries are admitted later by the LSQ refresh.

use crate::core::cpu::{Core, IssueQueues, QueueSlot};
use crate::core::pipeline::rob::EntryRef;
use crate::core::thread::{Thread, ThreadState};

/// Dispatches up to `decode_width` entries, round-robin over the threads.
pub fn dispatch_stage(core: &mut Core) {
    let n = core.threads.len();
    let mut budget = core.decode_width;
    let mut idle = 0;
    while budget > 0 && idle < n {
        let t = core.dispatch_cursor % n;
        core.dispatch_cursor = (t + 1) % n;
        let thread = &mut core.threads[t];
        if thread.state == ThreadState::Running && dispatch_one(t, thread, &mut core.queues) {
            budget -= 1;
            idle = 0;
        } else {
            idle += 1;
        }
    }
}

/// Dispatches the oldest undispatched ROB entry of `thread`.
pub fn dispatch_one(t: usize, thread: &mut Thread, queues: &mut IssueQueues) -> bool {
    let Some(rob) = thread
        .rob
        .iter()
        .find(|(_, e)| !e.status.dispatched)
        .map(|(h, _)| h)
    else {
        return false;
    };
    let Some(entry) = thread.rob.get_mut(rob) else {
        return false;
    };
    entry.status.dispatched = true;
    let slot = QueueSlot {
        thread: t,
        entry: EntryRef::Rob(rob),
    };
    if entry.all_operands_ready() {
        queues.ready_instructions.push(slot);
    } else {
        queues.waiting_instructions.push(slot);
    }

    if let Some(lsq) = entry.lsq {
        if let Some(mem) = thread.lsq.get_mut(lsq) {
            mem.status.dispatched = true;
            if mem.is_store {
                let slot = QueueSlot {
                    thread: t,
                    entry: EntryRef::Lsq(lsq),
                };
                if mem.all_operands_ready() {
                    queues.ready_stores.push(slot);
                } else {
                    queues.waiting_stores.push(slot);
                }
            }
        }
    }
    true
}
