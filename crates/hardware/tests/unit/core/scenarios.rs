//! Whole-Machine Scenarios.
//!
//! Runs small programs through the complete machine and checks what leaves
//! the pipeline: commit bandwidth, SMT and multicore progress, and the commit
//! watchdog.

use crate::common::builder::{ConfigBuilder, ProgramBuilder};
use crate::common::harness::{init_logging, run_programs};
use cmpsim_core::common::SimError;
use cmpsim_core::core::ThreadState;
use cmpsim_core::isa::ArchReg;
use cmpsim_core::isa::simple::asm::{addi, bne, fadd, fsqrt, lw, mul, sw};
use cmpsim_core::Simulation;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Commit bandwidth
// ══════════════════════════════════════════════════════════

#[test]
fn commit_width_bounds_retirement_per_cycle() {
    init_logging();
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 1), addi(2, 0, 2), addi(3, 0, 3), addi(4, 0, 4)])
        .build();
    let config = ConfigBuilder::new().decode_buffer(8).commit_width(2).build();
    let mut sim = Simulation::new(config, vec![program]).unwrap();

    let mut per_cycle = Vec::new();
    let mut last = 0;
    while !sim.is_finished() && sim.measured_cycles() < 10_000 {
        sim.step().unwrap();
        let now = sim.committed();
        if now > last {
            per_cycle.push(now - last);
        }
        last = now;
    }
    assert_eq!(per_cycle, vec![2, 2]);
    assert_eq!(sim.threads().map(|t| t.stats.squashes).sum::<u64>(), 0);
    assert!(sim.regfiles_consistent());
}

#[test]
fn dependent_chain_computes_through_renaming() {
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 3), addi(1, 1, 4), mul(2, 1, 1), addi(1, 2, -9)])
        .build();
    let sim = run_programs(ConfigBuilder::new().build(), vec![program]).unwrap();
    let ctx = sim.main_thread().unwrap().context.as_ref().unwrap();
    assert_eq!(ctx.read_reg(ArchReg::Int(2)), 49);
    assert_eq!(ctx.read_reg(ArchReg::Int(1)), 40);
    assert_eq!(sim.committed(), 4);
}

#[test]
fn loop_retires_every_iteration() {
    // r1 = 5; loop: r2 += 2; r1 -= 1; bne r1, r0, loop
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 5), addi(2, 2, 2), addi(1, 1, -1), bne(1, 0, -3)])
        .build();
    let sim = run_programs(ConfigBuilder::new().build(), vec![program]).unwrap();
    let thread = sim.main_thread().unwrap();
    assert_eq!(thread.stats.committed, 1 + 5 * 3);
    assert_eq!(thread.stats.predictions, 5);
    assert_eq!(thread.context.as_ref().unwrap().read_reg(ArchReg::Int(2)), 10);
}

#[test]
fn floating_point_units_complete() {
    let program = ProgramBuilder::new()
        .extend(&[fadd(1, 0, 0), fsqrt(2, 1), fadd(3, 2, 1)])
        .build();
    let sim = run_programs(ConfigBuilder::new().build(), vec![program]).unwrap();
    assert!(sim.is_finished());
    assert_eq!(sim.committed(), 3);
    let core = &sim.cores()[0];
    assert!(core.fu.is_idle());
}

// ══════════════════════════════════════════════════════════
// 2. SMT and multicore
// ══════════════════════════════════════════════════════════

#[test]
fn smt_threads_share_a_core() {
    let a = ProgramBuilder::new()
        .extend(&[addi(1, 0, 7), sw(1, 0, 0x200), addi(2, 1, 1)])
        .build();
    let b = ProgramBuilder::at(0x4000)
        .extend(&[addi(1, 0, 9), lw(2, 0, 0x300), addi(3, 1, 1)])
        .data(0x300, 11)
        .build();
    let config = ConfigBuilder::new().threads(2).build();
    let sim = run_programs(config, vec![a, b]).unwrap();

    let threads: Vec<_> = sim.threads().collect();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|t| t.state == ThreadState::Finished));
    assert_eq!(threads[0].stats.committed, 3);
    assert_eq!(threads[1].stats.committed, 3);
    assert_eq!(threads[1].context.as_ref().unwrap().read_reg(ArchReg::Int(2)), 11);
    assert_eq!(threads[0].name, "c0t0");
    assert_eq!(threads[1].name, "c0t1");
}

#[test]
fn cores_run_independent_programs() {
    let program = |v: i16| {
        ProgramBuilder::new()
            .extend(&[addi(1, 0, v), sw(1, 0, 0x400), lw(2, 0, 0x400)])
            .build()
    };
    let config = ConfigBuilder::new().cores(2).build();
    let sim = run_programs(config, vec![program(3), program(4)]).unwrap();

    assert!(sim.is_finished());
    assert_eq!(sim.committed(), 6);
    let values: Vec<u32> = sim
        .threads()
        .map(|t| t.context.as_ref().unwrap().read_reg(ArchReg::Int(2)))
        .collect();
    assert_eq!(values, vec![3, 4], "each context keeps its own memory image");
    sim.check_invariants().unwrap();
}

#[test]
fn idle_threads_are_finished_from_the_start() {
    let program = ProgramBuilder::new().push(addi(1, 0, 1)).build();
    let config = ConfigBuilder::new().cores(2).threads(2).build();
    let sim = Simulation::new(config, vec![program]).unwrap();
    let states: Vec<_> = sim.threads().map(|t| t.state).collect();
    assert_eq!(
        states,
        vec![
            ThreadState::Running,
            ThreadState::Finished,
            ThreadState::Finished,
            ThreadState::Finished
        ]
    );
}

// ══════════════════════════════════════════════════════════
// 3. Commit watchdog
// ══════════════════════════════════════════════════════════

#[test]
fn stalled_thread_is_a_liveness_failure() {
    init_logging();
    let program = ProgramBuilder::new()
        .extend(&[lw(1, 0, 0x100), addi(2, 1, 1)])
        .build();
    let config = ConfigBuilder::new()
        .commit_timeout(10)
        .memory_latency(1_000)
        .build();
    let mut sim = Simulation::new(config, vec![program]).unwrap();
    let err = sim.run().unwrap_err();
    match err {
        SimError::Liveness {
            thread, committed, ..
        } => {
            assert_eq!(thread, "c0t0");
            assert_eq!(committed, 0);
        }
        other => panic!("expected a liveness failure, got {other}"),
    }
    assert_eq!(sim.main_thread().unwrap().stats.commit_timeouts, 6);
}

#[test]
fn slow_memory_within_the_timeout_is_tolerated() {
    let program = ProgramBuilder::new().push(lw(1, 0, 0x100)).build();
    let config = ConfigBuilder::new()
        .commit_timeout(5_000)
        .memory_latency(500)
        .build();
    let sim = run_programs(config, vec![program]).unwrap();
    assert!(sim.is_finished());
    assert_eq!(sim.main_thread().unwrap().stats.commit_timeouts, 0);
}

#[test]
fn max_cycles_stops_an_unfinished_run() {
    // Infinite loop: bne r1, r0, -1 with r1 = 1.
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 1), bne(1, 0, -1)])
        .build();
    let config = ConfigBuilder::new().max_cycles(2_000).build();
    let sim = run_programs(config, vec![program]).unwrap();
    assert!(!sim.is_finished());
    assert_eq!(sim.measured_cycles(), 2_000);
    assert!(sim.committed() > 1);
}
