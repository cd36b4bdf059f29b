//! Fetch Stage.
//!
//! Fetch decodes and functionally executes instructions against the thread's
//! context, so every fetched instruction already knows its effective address
//! and its actual successor. It performs:
//! 1. **Instruction Cache:** Each new line is requested from the L1 instruction
//!    cache; fetch stalls until the line arrives.
//! 2. **Speculation:** When the predicted path leaves the executed one, the
//!    context enters speculative state and follows fetch.
//! 3. **Prediction:** Control instructions consult the branch predictor.
//! 4. **Group End:** A fetch group ends at a taken prediction or the end of a
//!    cache line.

use crate::common::constants::INSTRUCTION_SIZE;
use crate::core::cpu::Core;
use crate::core::thread::{DecodeBufferEntry, Thread, ThreadState};
use crate::core::units::bru::{BranchPredictor, Prediction};
use crate::isa::{ContextState, DynamicInstruction, IsaEngine};
use crate::sim::SimContext;
use crate::sim::event::{AccessTarget, AccessToken};

/// Executes the fetch stage for every running thread of `core`.
pub fn fetch_stage(core: &mut Core, sim: &mut SimContext<'_>) {
    let line_bytes = sim.memory.icache_line_bytes(core.id) as u32;
    for thread in &mut core.threads {
        if thread.state == ThreadState::Running && thread.context_running() {
            fetch_thread(core.id, thread, core.isa.as_ref(), line_bytes, sim);
        }
    }
}

/// Requests the line holding the fetch pc if it is new. Returns true if
/// instructions can be fetched this cycle.
fn can_fetch(core: usize, thread: &mut Thread, line_bytes: u32, sim: &mut SimContext<'_>) -> bool {
    if thread.fetch_stalled {
        thread.stats.fetch_stalls_icache += 1;
        return false;
    }
    let line = thread.fetch_pc - thread.fetch_pc % line_bytes;
    if thread.last_fetch_line == Some(line) {
        return true;
    }
    if sim.memory.can_ifetch(core, thread.fetch_pc) {
        let token = AccessToken {
            core,
            thread: thread.index,
            target: AccessTarget::Ifetch,
        };
        sim.memory.ifetch(core, thread.fetch_pc, token, sim.events);
        thread.fetch_stalled = true;
        thread.last_fetch_line = Some(line);
    } else {
        thread.stats.fetch_stalls_icache += 1;
    }
    false
}

fn fetch_thread(
    core: usize,
    thread: &mut Thread,
    isa: &dyn IsaEngine,
    line_bytes: u32,
    sim: &mut SimContext<'_>,
) {
    if !can_fetch(core, thread, line_bytes, sim) {
        return;
    }
    let Some(ctx) = thread.context.as_deref_mut() else {
        return;
    };

    loop {
        if ctx.state() != ContextState::Running {
            break;
        }
        if thread.decode_buffer.len() >= thread.decode_buffer_capacity {
            thread.stats.fetch_stalls_decode_buffer_full += 1;
            break;
        }

        if ctx.npc() != thread.fetch_pc {
            if !ctx.is_speculative() {
                ctx.enter_speculative_state();
            }
            ctx.set_npc(thread.fetch_pc);
        }

        let pc = ctx.step();
        let inst = isa.decode(ctx.fetch_word(pc));
        let ea = isa.execute(&inst, ctx);

        // Off the text segment a wrong path only finds no-ops; queue one so the
        // squash that ends the path can reach it.
        let off_text = !ctx.contains_pc(pc);
        if inst.is_nop() && !off_text {
            thread.fetch_pc = ctx.npc();
            if thread.fetch_pc % line_bytes == 0 {
                break;
            }
            continue;
        }

        let sequential = pc.wrapping_add(INSTRUCTION_SIZE);
        let prediction = if inst.mnemonic.is_control() {
            thread.predictor.predict(pc, &inst.mnemonic)
        } else {
            Prediction {
                ras_checkpoint: thread.predictor.checkpoint(),
                ..Prediction::default()
            }
        };
        let predicted_npc = prediction.target.unwrap_or(sequential);
        thread.fetch_pc = predicted_npc;

        let done = off_text || predicted_npc != sequential || sequential % line_bytes == 0;

        thread.decode_buffer.push_back(DecodeBufferEntry {
            inst: DynamicInstruction::new(sim.ids.next_id(), pc, inst, ea),
            npc: ctx.npc(),
            predicted_npc,
            ras_checkpoint: prediction.ras_checkpoint,
            predictor_update: prediction.update,
            speculative: ctx.is_speculative(),
        });
        thread.stats.fetched += 1;

        if done {
            break;
        }
    }
}
