//! Functional phases.
//!
//! Fast-forward runs programs without any timing model. Cache warm-up runs them
//! functionally one instruction per cycle while touching the caches, so the
//! measured phase starts with warm instruction and data caches.

use crate::core::thread::{Thread, WarmupInst};
use crate::isa::{ContextState, IsaEngine, StaticInstruction};
use crate::sim::SimContext;
use crate::sim::event::{AccessTarget, AccessToken};

/// Executes instructions up to and including the next one that is not a no-op.
fn execute_next(thread: &mut Thread, isa: &dyn IsaEngine) -> Option<(u32, StaticInstruction, Option<u32>)> {
    let ctx = thread.context.as_deref_mut()?;
    loop {
        if ctx.state() != ContextState::Running {
            return None;
        }
        let pc = ctx.step();
        let inst = isa.decode(ctx.fetch_word(pc));
        let ea = isa.execute(&inst, ctx);
        if !inst.is_nop() {
            thread.stats.functional += 1;
            return Some((pc, inst, ea));
        }
    }
}

/// One fast-forward cycle of `thread`. Returns false once the thread has
/// nothing left to execute.
pub fn fast_forward_one_cycle(thread: &mut Thread, isa: &dyn IsaEngine) -> bool {
    execute_next(thread, isa).is_some()
}

/// One cache warm-up cycle of `thread`.
///
/// The next instruction is executed once and held until the instruction cache
/// accepted its line and the data cache accepted its load or store.
pub fn warmup_one_cycle(core: usize, thread: &mut Thread, isa: &dyn IsaEngine, sim: &mut SimContext<'_>) {
    if thread.fetch_stalled {
        return;
    }
    if thread.warmup.is_none() {
        let Some((pc, inst, ea)) = execute_next(thread, isa) else {
            return;
        };
        thread.warmup = Some(WarmupInst {
            pc,
            load: inst.is_load(),
            store: inst.is_store(),
            ea: ea.unwrap_or(0),
        });
    }
    let Some(pending) = thread.warmup else {
        return;
    };

    let line_bytes = sim.memory.icache_line_bytes(core) as u32;
    let line = pending.pc - pending.pc % line_bytes;
    if thread.last_fetch_line != Some(line) {
        if !sim.memory.can_ifetch(core, pending.pc) {
            return;
        }
        let token = AccessToken {
            core,
            thread: thread.index,
            target: AccessTarget::Ifetch,
        };
        sim.memory.ifetch(core, pending.pc, token, sim.events);
        thread.fetch_stalled = true;
        thread.last_fetch_line = Some(line);
    }

    let token = AccessToken {
        core,
        thread: thread.index,
        target: AccessTarget::Warmup,
    };
    if pending.load {
        if sim.memory.can_load(core, pending.ea) {
            sim.memory.load(core, pending.ea, token, sim.events);
            thread.warmup = None;
        }
    } else if pending.store {
        if sim.memory.can_store(core, pending.ea) {
            sim.memory.store(core, pending.ea, token, sim.events);
            thread.warmup = None;
        }
    } else {
        thread.warmup = None;
    }
}
