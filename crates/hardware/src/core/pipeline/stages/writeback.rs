//! Writeback Stage.
//!
//! Drains the completions collected since the previous cycle. A completed
//! entry produces its target registers, which releases the consumers that were
//! waiting on them:
//! 1. **Operands:** The consumer has one fewer outstanding source.
//! 2. **Store Addresses:** The LSQ entry's address resolves next cycle.
//! 3. **Effective Addresses:** The load or store ROB entry may compute its address.
//!
//! Completions of squashed entries carry stale handles and are dropped.

use crate::core::cpu::Core;
use crate::core::pipeline::regfile::{PhysRegFiles, PhysRegId};
use crate::core::pipeline::rob::EntryRef;
use crate::core::thread::Thread;

/// Writes back every completion queued on `core`.
pub fn writeback_stage(core: &mut Core, cycle: u64) {
    for slot in std::mem::take(&mut core.completed) {
        let Some(thread) = core.threads.get_mut(slot.thread) else {
            continue;
        };
        let targets = match slot.entry {
            EntryRef::Rob(h) => match thread.rob.get_mut(h) {
                Some(e) if !e.status.squashed => {
                    e.status.completed = true;
                    if e.kind.is_memory() {
                        Vec::new()
                    } else {
                        e.targets.iter().map(|m| m.new).collect()
                    }
                }
                _ => continue,
            },
            EntryRef::Lsq(h) => match thread.lsq.get_mut(h) {
                Some(e) if !e.status.squashed => {
                    e.status.completed = true;
                    e.targets.clone()
                }
                _ => continue,
            },
        };
        write_back_targets(thread, &mut core.regs, &targets, cycle);
        core.stats.written_back += 1;
    }
}

/// Produces `targets` and wakes their consumers in `thread`.
pub fn write_back_targets(
    thread: &mut Thread,
    regs: &mut PhysRegFiles,
    targets: &[PhysRegId],
    cycle: u64,
) {
    for reg in targets {
        let Some(wakeup) = regs.file_mut(reg.class).writeback(reg.index) else {
            continue;
        };
        for consumer in wakeup.operands {
            match consumer {
                EntryRef::Rob(h) => {
                    if let Some(e) = thread.rob.get_mut(h) {
                        e.not_ready_operands = e.not_ready_operands.saturating_sub(1);
                    }
                }
                EntryRef::Lsq(h) => {
                    if let Some(e) = thread.lsq.get_mut(h) {
                        e.not_ready_operands = e.not_ready_operands.saturating_sub(1);
                    }
                }
            }
        }
        for h in wakeup.store_addresses {
            if let Some(e) = thread.lsq.get_mut(h) {
                e.set_store_address_ready(cycle);
            }
        }
        for h in wakeup.ea_operands {
            if let Some(e) = thread.rob.get_mut(h) {
                e.ea_operand_ready = true;
            }
        }
    }
}
