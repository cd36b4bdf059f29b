//! Commit Stage.
//!
//! Retires instructions from the reorder buffer head, in program order, up to
//! `commit_width` per thread per cycle. It handles:
//! 1. **Retirement:** Superseded physical registers are reclaimed and the new
//!    mappings become architectural.
//! 2. **Memory:** A load or store retires only once its LSQ entry completed;
//!    the LSQ entry is released with it.
//! 3. **Recovery:** A speculative head means fetch left the executed path. The
//!    predictor and context are restored and the thread's pipeline is squashed.
//! 4. **Watchdog:** A thread that stops committing is warned about, then
//!    declared dead.

use tracing::{debug, warn};

use crate::common::constants::{INSTRUCTION_SIZE, MAX_COMMIT_STRIKES};
use crate::common::{SimError, SimResult};
use crate::core::cpu::{Core, IssueQueues};
use crate::core::pipeline::regfile::{PhysRegFiles, RegOp};
use crate::core::thread::{Thread, ThreadState};
use crate::core::units::bru::{BranchOutcome, BranchPredictor};
use crate::core::units::fu::FuPool;

/// Commits every running thread of `core`.
pub fn commit_stage(core: &mut Core, cycle: u64) -> SimResult<()> {
    for t in 0..core.threads.len() {
        let thread = &mut core.threads[t];
        if thread.state != ThreadState::Running || thread.context.is_none() {
            continue;
        }
        check_progress(thread, core.commit_timeout, cycle)?;
        if commit_thread(thread, &mut core.regs, core.commit_width, cycle)? {
            squash(t, thread, &mut core.regs, &mut core.fu, &mut core.queues, cycle)?;
        }
    }
    Ok(())
}

/// Commit watchdog. Every `timeout` cycles without a commit is one strike.
fn check_progress(thread: &mut Thread, timeout: u64, cycle: u64) -> SimResult<()> {
    if cycle.saturating_sub(thread.last_commit_cycle) <= timeout {
        return Ok(());
    }
    thread.stats.commit_timeouts += 1;
    if thread.stats.commit_timeouts > MAX_COMMIT_STRIKES {
        return Err(SimError::Liveness {
            thread: thread.name.clone(),
            cycle,
            committed: thread.stats.committed,
        });
    }
    warn!(
        thread = %thread.name,
        cycle,
        strike = thread.stats.commit_timeouts,
        rob = thread.rob.len(),
        lsq = thread.lsq.len(),
        "no instruction committed within the timeout"
    );
    thread.last_commit_cycle = cycle;
    Ok(())
}

/// Retires from the head of `thread`. Returns true if the thread must be squashed.
fn commit_thread(
    thread: &mut Thread,
    regs: &mut PhysRegFiles,
    width: usize,
    cycle: u64,
) -> SimResult<bool> {
    let mut committed = 0;
    while committed < width {
        let Some(head) = thread.rob.head() else {
            break;
        };
        let Some(entry) = thread.rob.get_mut(head) else {
            break;
        };

        if !entry.status.completed {
            entry.inst.cycles_at_head += 1;
            thread.stats.cycles_head_incomplete += 1;
            break;
        }

        if entry.speculative {
            thread.predictor.recover(entry.ras_checkpoint);
            if let Some(ctx) = thread.context.as_deref_mut() {
                ctx.exit_speculative_state();
                thread.fetch_pc = ctx.npc();
            }
            return Ok(true);
        }

        if let Some(lsq) = entry.lsq {
            if !thread.lsq.get(lsq).is_some_and(|e| e.status.completed) {
                thread.stats.cycles_head_incomplete += 1;
                break;
            }
            if thread.lsq.remove(lsq).is_none() {
                return Err(lsq_missing(&thread.name, cycle));
            }
        }

        for m in &entry.targets {
            regs.apply(m.old, RegOp::Reclaim, cycle)?;
            regs.apply(m.new, RegOp::Commit, cycle)?;
        }

        if entry.is_control() {
            let pc = entry.inst.pc;
            let sequential = pc.wrapping_add(INSTRUCTION_SIZE);
            let outcome = BranchOutcome {
                target: entry.npc,
                taken: entry.npc != sequential,
                predicted_taken: entry.predicted_npc != sequential,
                correct: entry.predicted_npc == entry.npc,
            };
            thread.predictor.update(
                pc,
                &entry.inst.inst.mnemonic,
                outcome,
                entry.predictor_update,
            );
            thread.stats.predictions += 1;
            if !outcome.correct {
                thread.stats.mispredictions += 1;
            }
        }

        #[cfg(feature = "commit-log")]
        tracing::trace!(
            thread = %thread.name,
            cycle,
            id = entry.inst.id,
            pc = format_args!("{:#010x}", entry.inst.pc),
            mnemonic = entry.inst.inst.mnemonic.name,
            "commit"
        );

        let _ = thread.rob.pop_head();
        thread.stats.committed += 1;
        thread.last_commit_cycle = cycle;
        committed += 1;
    }
    Ok(false)
}

/// Discards every in-flight instruction of `thread`, youngest first.
///
/// Rename mappings are rolled back to the values they had before each entry,
/// so the rename table ends equal to the committed mapping. Functional units of
/// the core are released and the thread's issue queue slots are purged. The
/// thread stays in [`ThreadState::Squashing`] until its outstanding memory
/// accesses have drained.
pub fn squash(
    t: usize,
    thread: &mut Thread,
    regs: &mut PhysRegFiles,
    fu: &mut FuPool,
    queues: &mut IssueQueues,
    cycle: u64,
) -> SimResult<()> {
    let mut discarded = 0_u64;
    while let Some((_, entry)) = thread.rob.pop_tail() {
        if let Some(lsq) = entry.lsq {
            if thread.lsq.remove(lsq).is_none() {
                return Err(lsq_missing(&thread.name, cycle));
            }
        }
        for m in entry.targets.iter().rev() {
            thread.rename_table.set(m.arch, m.old);
            regs.apply(m.new, RegOp::Recover, cycle)?;
        }
        discarded += 1;
    }
    while thread.lsq.pop_tail().is_some() {}

    discarded += thread.decode_buffer.len() as u64;
    thread.decode_buffer.clear();
    fu.release_all();
    queues.purge_thread(t);

    if thread.outstanding_accesses > 0 {
        thread.state = ThreadState::Squashing;
    }
    thread.stats.squashes += 1;
    thread.stats.squashed_entries += discarded;
    debug!(
        thread = %thread.name,
        discarded,
        outstanding = thread.outstanding_accesses,
        fetch_pc = format_args!("{:#010x}", thread.fetch_pc),
        "squash"
    );
    Ok(())
}

fn lsq_missing(thread: &str, cycle: u64) -> SimError {
    SimError::UnknownTarget {
        what: format!("{thread} LSQ entry"),
        cycle,
    }
}
