//! Toy Instruction Set Tests.
//!
//! Decoding classifies every operation for the pipeline (behaviour class,
//! functional unit, source and destination registers); execution runs it
//! against a context.

use cmpsim_core::isa::simple::asm::*;
use cmpsim_core::isa::{
    ArchReg, ContextState, ExecutionContext, FuOperation, IsaEngine, MnemonicKind, Program,
    ProgramContext, SimpleIsa,
};
use rstest::rstest;

fn run(text: &[u32]) -> ProgramContext {
    let mut ctx = ProgramContext::new(Program::new(0x1000, text.to_vec()));
    for _ in 0..1_000 {
        if ctx.state() != ContextState::Running {
            break;
        }
        let pc = ctx.step();
        let inst = SimpleIsa.decode(ctx.fetch_word(pc));
        let _ = SimpleIsa.execute(&inst, &mut ctx);
    }
    ctx
}

// ══════════════════════════════════════════════════════════
// 1. Decode
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(addi(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::IntAlu))]
#[case(mul(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::IntMult))]
#[case(div(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::IntDiv))]
#[case(fadd(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::FpAdd))]
#[case(fmul(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::FpMult))]
#[case(fdiv(1, 2, 3), MnemonicKind::Plain, Some(FuOperation::FpDiv))]
#[case(fsqrt(1, 2), MnemonicKind::Plain, Some(FuOperation::FpSqrt))]
#[case(lw(1, 2, 0), MnemonicKind::Load, Some(FuOperation::ReadPort))]
#[case(sw(1, 2, 0), MnemonicKind::Store, Some(FuOperation::WritePort))]
#[case(beq(1, 2, 4), MnemonicKind::Conditional, Some(FuOperation::IntAlu))]
#[case(j(0x2000), MnemonicKind::Unconditional, None)]
#[case(jal(0x2000), MnemonicKind::FunctionCall, Some(FuOperation::IntAlu))]
#[case(jr(31), MnemonicKind::FunctionReturn, Some(FuOperation::IntAlu))]
#[case(jr(7), MnemonicKind::Unconditional, Some(FuOperation::IntAlu))]
#[case(nop(), MnemonicKind::Nop, None)]
fn decode_classifies(
    #[case] word: u32,
    #[case] kind: MnemonicKind,
    #[case] fu: Option<FuOperation>,
) {
    let inst = SimpleIsa.decode(word);
    assert_eq!(inst.mnemonic.kind, kind, "{}", inst.mnemonic.name);
    assert_eq!(inst.mnemonic.fu_op, fu, "{}", inst.mnemonic.name);
}

#[test]
fn div_writes_quotient_and_hi() {
    let inst = SimpleIsa.decode(div(3, 1, 2));
    assert_eq!(inst.inputs, vec![ArchReg::Int(1), ArchReg::Int(2)]);
    assert!(inst.outputs.contains(&ArchReg::Int(3)));
    assert!(inst.outputs.iter().any(|r| matches!(r, ArchReg::Misc(_))));
}

#[test]
fn load_reads_its_base_and_writes_its_destination() {
    let inst = SimpleIsa.decode(lw(4, 5, 8));
    assert!(inst.is_load());
    assert_eq!(inst.inputs, vec![ArchReg::Int(5)]);
    assert_eq!(inst.outputs, vec![ArchReg::Int(4)]);
}

#[test]
fn call_writes_the_return_register() {
    let inst = SimpleIsa.decode(jal(0x2000));
    assert_eq!(inst.outputs, vec![ArchReg::Int(31)]);
}

// ══════════════════════════════════════════════════════════
// 2. Execute
// ══════════════════════════════════════════════════════════

#[test]
fn arithmetic() {
    let ctx = run(&[addi(1, 0, 20), addi(2, 0, 6), sub(3, 1, 2), mul(4, 1, 2), div(5, 1, 2), mfhi(6)]);
    assert_eq!(ctx.read_reg(ArchReg::Int(3)), 14);
    assert_eq!(ctx.read_reg(ArchReg::Int(4)), 120);
    assert_eq!(ctx.read_reg(ArchReg::Int(5)), 3);
    assert_eq!(ctx.read_reg(ArchReg::Int(6)), 2);
}

#[test]
fn negative_immediates_sign_extend() {
    let ctx = run(&[addi(1, 0, -4), add(2, 1, 1)]);
    assert_eq!(ctx.read_reg(ArchReg::Int(1)) as i32, -4);
    assert_eq!(ctx.read_reg(ArchReg::Int(2)) as i32, -8);
}

#[test]
fn effective_address_is_returned_for_memory_operations() {
    let mut ctx = ProgramContext::new(Program::new(0x1000, vec![addi(1, 0, 0x200), lw(2, 1, 12)]));
    for expected in [None, Some(0x20C)] {
        let pc = ctx.step();
        let inst = SimpleIsa.decode(ctx.fetch_word(pc));
        assert_eq!(SimpleIsa.execute(&inst, &mut ctx), expected);
    }
}

#[test]
fn taken_branch_skips_instructions() {
    let ctx = run(&[addi(1, 0, 1), beq(1, 1, 1), addi(2, 0, 9), addi(3, 0, 7)]);
    assert_eq!(ctx.read_reg(ArchReg::Int(2)), 0);
    assert_eq!(ctx.read_reg(ArchReg::Int(3)), 7);
}

#[test]
fn jump_leaves_the_text_and_finishes() {
    let ctx = run(&[j(0x8000), addi(1, 0, 1)]);
    assert_eq!(ctx.state(), ContextState::Finished);
    assert_eq!(ctx.read_reg(ArchReg::Int(1)), 0);
}
