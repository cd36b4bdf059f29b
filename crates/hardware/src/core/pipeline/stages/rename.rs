//! Register Rename Stage.
//!
//! Moves instructions from the decode buffer into the reorder buffer, renaming
//! through the thread's rename table. Source mappings are read before any
//! target of the same instruction is remapped, so an instruction reading its
//! own destination sees the previous producer. Loads and stores also receive
//! a linked LSQ entry that shares their sources and, for loads, their targets.

use crate::common::IdCounter;
use crate::core::cpu::Core;
use crate::core::pipeline::regfile::{PhysRegFiles, PhysRegId};
use crate::core::pipeline::rob::{EntryRef, EntryStatus, LsqEntry, Mapping, RobEntry, RobKind};
use crate::core::thread::{Thread, ThreadState};
use crate::isa::{MnemonicKind, RegClass};

/// Renames up to `decode_width` instructions, round-robin over the threads.
pub fn rename_stage(core: &mut Core, ids: &mut IdCounter, cycle: u64) {
    let n = core.threads.len();
    let mut budget = core.decode_width;
    let mut idle = 0;
    while budget > 0 && idle < n {
        let t = core.rename_cursor % n;
        core.rename_cursor = (t + 1) % n;
        let thread = &mut core.threads[t];
        let eligible = if thread.state != ThreadState::Running || thread.context.is_none() {
            false
        } else if thread.decode_buffer.is_empty() {
            thread.stats.rename_stalls_decode_buffer_empty += 1;
            false
        } else if thread.rob.is_full() {
            thread.stats.rename_stalls_rob_full += 1;
            false
        } else {
            true
        };
        if eligible && rename_one(thread, &mut core.regs, ids, cycle) {
            budget -= 1;
            idle = 0;
        } else {
            idle += 1;
        }
    }
}

/// Renames the decode buffer head of `thread`. Returns false on a structural stall.
pub fn rename_one(
    thread: &mut Thread,
    regs: &mut PhysRegFiles,
    ids: &mut IdCounter,
    cycle: u64,
) -> bool {
    let Some(head) = thread.decode_buffer.front() else {
        return false;
    };
    let inst = &head.inst.inst;

    let mut needed = [0_usize; 3];
    for out in inst.outputs.iter().filter(|r| !r.is_zero()) {
        needed[out.class().index()] += 1;
    }
    if RegClass::ALL
        .iter()
        .any(|&c| regs.file(c).free_count() < needed[c.index()])
    {
        thread.stats.rename_stalls_no_phys_reg += 1;
        return false;
    }
    let kind = match inst.mnemonic.kind {
        MnemonicKind::Load => RobKind::Load,
        MnemonicKind::Store => RobKind::Store,
        _ => RobKind::Plain,
    };
    if kind.is_memory() && thread.lsq.is_full() {
        thread.stats.rename_stalls_lsq_full += 1;
        return false;
    }
    if thread.rob.is_full() {
        return false;
    }

    let Some(entry) = thread.decode_buffer.pop_front() else {
        return false;
    };

    let sources: Vec<PhysRegId> = entry
        .inst
        .inst
        .inputs
        .iter()
        .filter_map(|&r| thread.rename_table.get(r))
        .collect();

    let mut targets = Vec::with_capacity(entry.inst.inst.outputs.len());
    for &arch in entry.inst.inst.outputs.iter().filter(|r| !r.is_zero()) {
        let Some(old) = thread.rename_table.get(arch) else {
            continue;
        };
        let Some(new) = regs.file_mut(arch.class()).allocate(arch) else {
            continue;
        };
        thread.rename_table.set(arch, new);
        targets.push(Mapping { arch, new, old });
    }

    let not_ready: Vec<PhysRegId> = sources.iter().copied().filter(|&r| !regs.is_ready(r)).collect();
    let base = sources.first().copied();
    let ea_operand_ready = base.is_some_and(|r| regs.is_ready(r));

    let rob_entry = RobEntry {
        kind,
        npc: entry.npc,
        predicted_npc: entry.predicted_npc,
        ras_checkpoint: entry.ras_checkpoint,
        predictor_update: entry.predictor_update,
        speculative: entry.speculative,
        sources: sources.clone(),
        targets: targets.clone(),
        not_ready_operands: not_ready.len(),
        ea_operand_ready,
        lsq: None,
        status: EntryStatus::default(),
        inst: entry.inst,
    };
    let pc = rob_entry.inst.pc;
    let inst_id = rob_entry.inst.id;
    let ea = rob_entry.inst.effective_address.unwrap_or(0);
    let Some(rob) = thread.rob.push(ids.next_id(), rob_entry) else {
        return false;
    };

    for &r in &not_ready {
        regs.file_mut(r.class).add_operand_dependent(r.index, EntryRef::Rob(rob));
    }

    if kind.is_memory() {
        if let Some(b) = base.filter(|&b| !regs.is_ready(b)) {
            regs.file_mut(b.class).add_ea_dependent(b.index, rob);
        }

        let lsq_entry = LsqEntry {
            inst_id,
            pc,
            ea,
            is_store: kind == RobKind::Store,
            store_address_ready: false,
            address_ready_cycle: None,
            sources,
            targets: targets.iter().map(|m| m.new).collect(),
            not_ready_operands: not_ready.len(),
            status: EntryStatus::default(),
            in_flight: false,
        };
        if let Some(lsq) = thread.lsq.push(ids.next_id(), lsq_entry) {
            for &r in &not_ready {
                regs.file_mut(r.class).add_operand_dependent(r.index, EntryRef::Lsq(lsq));
            }
            match base {
                Some(b) if !regs.is_ready(b) => {
                    regs.file_mut(b.class).add_store_address_dependent(b.index, lsq);
                }
                _ => {
                    if let Some(e) = thread.lsq.get_mut(lsq) {
                        e.set_store_address_ready(cycle);
                    }
                }
            }
            if let Some(e) = thread.rob.get_mut(rob) {
                e.lsq = Some(lsq);
            }
        }
    }
    true
}
