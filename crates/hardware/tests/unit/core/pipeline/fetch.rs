//! Fetch Tests.
//!
//! Every instruction cache line fetch reads from must have been requested
//! first, including lines entered by skipping no-ops.

use crate::common::builder::{ConfigBuilder, ProgramBuilder};
use crate::common::harness::run_programs;
use cmpsim_core::isa::simple::asm::{addi, nop};
use cmpsim_core::isa::ArchReg;

#[test]
fn skipping_nops_into_a_new_line_requests_it() {
    let line_words = ConfigBuilder::new().build().cache.l1i.line_bytes / 4;
    let mut program = ProgramBuilder::new();
    for _ in 0..line_words - 2 {
        program = program.push(addi(1, 1, 1));
    }
    let program = program.extend(&[nop(), nop(), addi(1, 1, 1)]);

    let config = ConfigBuilder::new().decode_buffer(4 * line_words).build();
    let sim = run_programs(config, vec![program.build()]).unwrap();

    assert!(sim.is_finished());
    let l1i = sim.memory().l1i(0).unwrap();
    assert_eq!(l1i.occupancy(), 2, "both text lines were requested");
    assert_eq!(l1i.stats.read_misses, 2);
    let thread = sim.main_thread().unwrap();
    assert_eq!(thread.stats.committed, line_words as u64 - 1);
    assert_eq!(
        thread.context.as_ref().unwrap().read_reg(ArchReg::Int(1)),
        line_words as u32 - 1
    );
}
