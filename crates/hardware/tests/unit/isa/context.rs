//! Execution Context Tests.

use cmpsim_core::isa::{ArchReg, ContextState, ExecutionContext, Program, ProgramContext};

fn context(words: usize) -> ProgramContext {
    ProgramContext::new(Program::new(0x1000, vec![0; words]).with_data(0x2004, 0xABCD))
}

#[test]
fn program_bounds() {
    let program = Program::new(0x1000, vec![0; 3]);
    assert_eq!(program.text_end(), 0x100C);
    assert!(program.contains(0x1000));
    assert!(program.contains(0x1008));
    assert!(!program.contains(0x100C));
    assert!(!program.contains(0x0FFC));
}

#[test]
fn off_text_fetch_reads_as_nop() {
    let ctx = context(2);
    assert!(!ctx.contains_pc(0x5000));
    assert_eq!(ctx.fetch_word(0x5000), 0);
}

#[test]
fn empty_program_is_finished_immediately() {
    let ctx = ProgramContext::new(Program::new(0x1000, Vec::new()));
    assert_eq!(ctx.state(), ContextState::Finished);
}

#[test]
fn data_image_is_word_addressed() {
    let mut ctx = context(1);
    assert_eq!(ctx.read_mem(0x2004), 0xABCD);
    assert_eq!(ctx.read_mem(0x2006), 0xABCD, "unaligned reads hit the enclosing word");
    ctx.write_mem(0x2008, 5);
    assert_eq!(ctx.read_mem(0x2008), 5);
    assert_eq!(ctx.read_mem(0x3000), 0, "untouched memory reads zero");
}

#[test]
fn speculative_stores_are_discarded_on_exit() {
    let mut ctx = context(4);
    let _ = ctx.step();
    ctx.enter_speculative_state();
    assert!(ctx.is_speculative());
    ctx.write_mem(0x2004, 1);
    ctx.write_reg(ArchReg::Fp(3), 0x4000_0000);
    ctx.exit_speculative_state();
    assert!(!ctx.is_speculative());
    assert_eq!(ctx.read_mem(0x2004), 0xABCD);
    assert_eq!(ctx.read_reg(ArchReg::Fp(3)), 0);
}

#[test]
fn nested_speculation_keeps_the_first_snapshot() {
    let mut ctx = context(4);
    let _ = ctx.step();
    ctx.enter_speculative_state();
    ctx.set_npc(0x1008);
    ctx.enter_speculative_state();
    ctx.exit_speculative_state();
    assert_eq!(ctx.npc(), 0x1004);
}

#[test]
fn killed_context_is_finished() {
    let mut ctx = context(4);
    assert_eq!(ctx.state(), ContextState::Running);
    ctx.kill();
    assert_eq!(ctx.state(), ContextState::Finished);
}
