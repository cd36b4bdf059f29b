//! Memory Disambiguation Tests.
//!
//! A load may not be sent to memory while an older store to the same address
//! has not produced its data, and no load may pass a store whose address is
//! still unknown. Once the store's data is produced, the load is satisfied by
//! forwarding instead of a cache access.

use crate::common::builder::{ConfigBuilder, ProgramBuilder};
use crate::common::harness::init_logging;
use cmpsim_core::core::cpu::QueueSlot;
use cmpsim_core::core::pipeline::rob::EntryRef;
use cmpsim_core::isa::ArchReg;
use cmpsim_core::isa::simple::asm::{addi, div, lw, sw};
use cmpsim_core::Simulation;

// ══════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════

/// `r2 = r1 / r1` is slow, so the store of `r2` waits on its data long after
/// its address `r1` is known.
fn store_then_load() -> Simulation {
    init_logging();
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 0x100), div(2, 1, 1), sw(2, 1, 0), lw(3, 1, 0)])
        .build();
    Simulation::new(ConfigBuilder::new().build(), vec![program]).unwrap()
}

/// True while the store's data is outstanding, checking the load is not
/// admitted to the ready-load queue meanwhile.
fn load_held_back(sim: &Simulation) -> bool {
    let core = &sim.cores()[0];
    let thread = &core.threads[0];
    let store = thread.lsq.iter().find(|(_, e)| e.is_store);
    let load = thread.lsq.iter().find(|(_, e)| !e.is_store);
    let (Some((_, store)), Some((load, _))) = (store, load) else {
        return false;
    };
    if store.all_operands_ready() || store.status.completed {
        return false;
    }
    let slot = QueueSlot {
        thread: 0,
        entry: EntryRef::Lsq(load),
    };
    assert!(
        !core.queues.ready_loads.contains(&slot),
        "load admitted at cycle {} before the older store produced its data",
        sim.cycle()
    );
    true
}

// ══════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════

#[test]
fn load_waits_for_older_store_data() {
    let mut sim = store_then_load();
    let mut held = 0;
    while !sim.is_finished() && sim.measured_cycles() < 10_000 {
        if load_held_back(&sim) {
            held += 1;
        }
        sim.step().unwrap();
    }
    assert!(sim.is_finished());
    assert!(held > 0, "the store data should have been outstanding for a while");
}

#[test]
fn load_is_forwarded_from_the_store() {
    let mut sim = store_then_load();
    sim.run().unwrap();

    let thread = sim.main_thread().unwrap();
    assert_eq!(thread.stats.committed, 4);
    assert_eq!(thread.stats.forwarded_loads, 1);
    let ctx = thread.context.as_ref().unwrap();
    assert_eq!(ctx.read_reg(ArchReg::Int(3)), 1);
    assert_eq!(ctx.read_mem(0x100), 1);
}

#[test]
fn loads_to_other_addresses_are_not_forwarded() {
    init_logging();
    let program = ProgramBuilder::new()
        .extend(&[addi(1, 0, 0x100), addi(2, 0, 9), sw(2, 1, 0), lw(3, 1, 0x40)])
        .data(0x140, 5)
        .build();
    let mut sim = Simulation::new(ConfigBuilder::new().build(), vec![program]).unwrap();
    sim.run().unwrap();

    let thread = sim.main_thread().unwrap();
    assert_eq!(thread.stats.committed, 4);
    assert_eq!(thread.stats.forwarded_loads, 0);
    assert_eq!(thread.context.as_ref().unwrap().read_reg(ArchReg::Int(3)), 5);
}
