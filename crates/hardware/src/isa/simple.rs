//! The simulated instruction set.
//!
//! A 32-bit load/store ISA with enough variety to exercise every pipeline path:
//! integer and floating-point arithmetic on all functional-unit classes, a
//! miscellaneous-class register (`HI`, written by `DIV`), loads, stores,
//! conditional branches, direct jumps, calls and returns.
//!
//! | Opcode | Mnemonic | Semantics |
//! |---|---|---|
//! | 0 | `nop` | |
//! | 1 | `addi a, b, imm` | `a = b + imm` |
//! | 2 | `add a, b, c` | `a = b + c` |
//! | 3 | `sub a, b, c` | `a = b - c` |
//! | 4 | `mul a, b, c` | `a = b * c` |
//! | 5 | `div a, b, c` | `a = b / c`, `HI = b % c` |
//! | 6 | `mfhi a` | `a = HI` |
//! | 7-9 | `fadd`/`fmul`/`fdiv fa, fb, fc` | single precision |
//! | 10 | `fsqrt fa, fb` | |
//! | 11 | `lw a, imm(b)` | |
//! | 12 | `sw a, imm(b)` | |
//! | 13/14 | `beq`/`bne a, b, imm` | target `pc + 4 + imm * 4` |
//! | 15 | `j target` | |
//! | 16 | `jal target` | `r31 = pc + 4` |
//! | 17 | `jr a` | return when `a == r31` |

use super::instruction::{FuOperation, InstructionBits, Mnemonic, MnemonicKind, StaticInstruction};
use super::{ArchReg, ExecutionContext, IsaEngine, RETURN_ADDRESS_REG};
use crate::common::constants::INSTRUCTION_SIZE;

/// Opcode numbers.
pub mod opcode {
    /// No operation.
    pub const NOP: u32 = 0;
    /// Add immediate.
    pub const ADDI: u32 = 1;
    /// Add.
    pub const ADD: u32 = 2;
    /// Subtract.
    pub const SUB: u32 = 3;
    /// Multiply.
    pub const MUL: u32 = 4;
    /// Divide with remainder to `HI`.
    pub const DIV: u32 = 5;
    /// Move from `HI`.
    pub const MFHI: u32 = 6;
    /// Floating-point add.
    pub const FADD: u32 = 7;
    /// Floating-point multiply.
    pub const FMUL: u32 = 8;
    /// Floating-point divide.
    pub const FDIV: u32 = 9;
    /// Floating-point square root.
    pub const FSQRT: u32 = 10;
    /// Load word.
    pub const LW: u32 = 11;
    /// Store word.
    pub const SW: u32 = 12;
    /// Branch if equal.
    pub const BEQ: u32 = 13;
    /// Branch if not equal.
    pub const BNE: u32 = 14;
    /// Jump.
    pub const J: u32 = 15;
    /// Jump and link.
    pub const JAL: u32 = 16;
    /// Jump register.
    pub const JR: u32 = 17;
}

const HI: ArchReg = ArchReg::Misc(0);

const fn mnemonic(name: &'static str, kind: MnemonicKind, fu_op: Option<FuOperation>) -> Mnemonic {
    Mnemonic { name, kind, fu_op }
}

/// Decoder and executor of the simulated ISA.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleIsa;

impl IsaEngine for SimpleIsa {
    fn decode(&self, word: u32) -> StaticInstruction {
        use MnemonicKind::{
            Conditional, FunctionCall, FunctionReturn, Load, Nop, Plain, Store, Unconditional,
        };

        let (a, b, c) = (word.ra(), word.rb(), word.rc());
        let (m, inputs, outputs) = match word.opcode() {
            opcode::ADDI => (
                mnemonic("addi", Plain, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(b)],
                vec![ArchReg::Int(a)],
            ),
            opcode::ADD => (
                mnemonic("add", Plain, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(b), ArchReg::Int(c)],
                vec![ArchReg::Int(a)],
            ),
            opcode::SUB => (
                mnemonic("sub", Plain, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(b), ArchReg::Int(c)],
                vec![ArchReg::Int(a)],
            ),
            opcode::MUL => (
                mnemonic("mul", Plain, Some(FuOperation::IntMult)),
                vec![ArchReg::Int(b), ArchReg::Int(c)],
                vec![ArchReg::Int(a)],
            ),
            opcode::DIV => (
                mnemonic("div", Plain, Some(FuOperation::IntDiv)),
                vec![ArchReg::Int(b), ArchReg::Int(c)],
                vec![ArchReg::Int(a), HI],
            ),
            opcode::MFHI => (
                mnemonic("mfhi", Plain, Some(FuOperation::IntAlu)),
                vec![HI],
                vec![ArchReg::Int(a)],
            ),
            opcode::FADD => (
                mnemonic("fadd", Plain, Some(FuOperation::FpAdd)),
                vec![ArchReg::Fp(b), ArchReg::Fp(c)],
                vec![ArchReg::Fp(a)],
            ),
            opcode::FMUL => (
                mnemonic("fmul", Plain, Some(FuOperation::FpMult)),
                vec![ArchReg::Fp(b), ArchReg::Fp(c)],
                vec![ArchReg::Fp(a)],
            ),
            opcode::FDIV => (
                mnemonic("fdiv", Plain, Some(FuOperation::FpDiv)),
                vec![ArchReg::Fp(b), ArchReg::Fp(c)],
                vec![ArchReg::Fp(a)],
            ),
            opcode::FSQRT => (
                mnemonic("fsqrt", Plain, Some(FuOperation::FpSqrt)),
                vec![ArchReg::Fp(b)],
                vec![ArchReg::Fp(a)],
            ),
            opcode::LW => (
                mnemonic("lw", Load, Some(FuOperation::ReadPort)),
                vec![ArchReg::Int(b)],
                vec![ArchReg::Int(a)],
            ),
            opcode::SW => (
                mnemonic("sw", Store, Some(FuOperation::WritePort)),
                vec![ArchReg::Int(b), ArchReg::Int(a)],
                vec![],
            ),
            opcode::BEQ => (
                mnemonic("beq", Conditional, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(a), ArchReg::Int(b)],
                vec![],
            ),
            opcode::BNE => (
                mnemonic("bne", Conditional, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(a), ArchReg::Int(b)],
                vec![],
            ),
            opcode::J => (mnemonic("j", Unconditional, None), vec![], vec![]),
            opcode::JAL => (
                mnemonic("jal", FunctionCall, Some(FuOperation::IntAlu)),
                vec![],
                vec![ArchReg::Int(RETURN_ADDRESS_REG)],
            ),
            opcode::JR if a == RETURN_ADDRESS_REG => (
                mnemonic("jr", FunctionReturn, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(a)],
                vec![],
            ),
            opcode::JR => (
                mnemonic("jr", Unconditional, Some(FuOperation::IntAlu)),
                vec![ArchReg::Int(a)],
                vec![],
            ),
            _ => (mnemonic("nop", Nop, None), vec![], vec![]),
        };

        StaticInstruction {
            word,
            mnemonic: m,
            inputs,
            outputs,
        }
    }

    fn execute(&self, inst: &StaticInstruction, ctx: &mut dyn ExecutionContext) -> Option<u32> {
        let word = inst.word;
        let (a, b, c) = (word.ra(), word.rb(), word.rc());
        let int = |ctx: &dyn ExecutionContext, r: u8| ctx.read_reg(ArchReg::Int(r));
        let fp = |ctx: &dyn ExecutionContext, r: u8| f32::from_bits(ctx.read_reg(ArchReg::Fp(r)));
        let pc = ctx.pc();
        let branch_target = pc
            .wrapping_add(INSTRUCTION_SIZE)
            .wrapping_add((word.imm() << 2) as u32);

        match word.opcode() {
            opcode::ADDI => {
                let v = int(ctx, b).wrapping_add(word.imm() as u32);
                ctx.write_reg(ArchReg::Int(a), v);
            }
            opcode::ADD => {
                let v = int(ctx, b).wrapping_add(int(ctx, c));
                ctx.write_reg(ArchReg::Int(a), v);
            }
            opcode::SUB => {
                let v = int(ctx, b).wrapping_sub(int(ctx, c));
                ctx.write_reg(ArchReg::Int(a), v);
            }
            opcode::MUL => {
                let v = int(ctx, b).wrapping_mul(int(ctx, c));
                ctx.write_reg(ArchReg::Int(a), v);
            }
            opcode::DIV => {
                let (x, y) = (int(ctx, b), int(ctx, c));
                let (q, r) = if y == 0 { (0, x) } else { (x / y, x % y) };
                ctx.write_reg(ArchReg::Int(a), q);
                ctx.write_reg(HI, r);
            }
            opcode::MFHI => {
                let v = ctx.read_reg(HI);
                ctx.write_reg(ArchReg::Int(a), v);
            }
            opcode::FADD => {
                let v = fp(ctx, b) + fp(ctx, c);
                ctx.write_reg(ArchReg::Fp(a), v.to_bits());
            }
            opcode::FMUL => {
                let v = fp(ctx, b) * fp(ctx, c);
                ctx.write_reg(ArchReg::Fp(a), v.to_bits());
            }
            opcode::FDIV => {
                let v = fp(ctx, b) / fp(ctx, c);
                ctx.write_reg(ArchReg::Fp(a), v.to_bits());
            }
            opcode::FSQRT => {
                let v = fp(ctx, b).sqrt();
                ctx.write_reg(ArchReg::Fp(a), v.to_bits());
            }
            opcode::LW => {
                let ea = int(ctx, b).wrapping_add(word.imm() as u32);
                let v = ctx.read_mem(ea);
                ctx.write_reg(ArchReg::Int(a), v);
                return Some(ea);
            }
            opcode::SW => {
                let ea = int(ctx, b).wrapping_add(word.imm() as u32);
                let v = int(ctx, a);
                ctx.write_mem(ea, v);
                return Some(ea);
            }
            opcode::BEQ => {
                if int(ctx, a) == int(ctx, b) {
                    ctx.set_npc(branch_target);
                }
            }
            opcode::BNE => {
                if int(ctx, a) != int(ctx, b) {
                    ctx.set_npc(branch_target);
                }
            }
            opcode::J => ctx.set_npc(jump_target(pc, word)),
            opcode::JAL => {
                ctx.write_reg(
                    ArchReg::Int(RETURN_ADDRESS_REG),
                    pc.wrapping_add(INSTRUCTION_SIZE),
                );
                ctx.set_npc(jump_target(pc, word));
            }
            opcode::JR => {
                let target = int(ctx, a);
                ctx.set_npc(target);
            }
            _ => {}
        }
        None
    }
}

const fn jump_target(pc: u32, word: u32) -> u32 {
    (pc & 0xF000_0000) | ((word & super::instruction::TARGET_MASK) << 2)
}

/// Encoders for building programs.
pub mod asm {
    use super::opcode;

    const fn r(op: u32, a: u8, b: u8, c: u8) -> u32 {
        (op << 26) | ((a as u32 & 0x1F) << 21) | ((b as u32 & 0x1F) << 16) | ((c as u32 & 0x1F) << 11)
    }

    const fn i(op: u32, a: u8, b: u8, imm: i16) -> u32 {
        (op << 26) | ((a as u32 & 0x1F) << 21) | ((b as u32 & 0x1F) << 16) | (imm as u16 as u32)
    }

    /// `nop`
    pub const fn nop() -> u32 {
        0
    }

    /// `addi rd, rs, imm`
    pub const fn addi(rd: u8, rs: u8, imm: i16) -> u32 {
        i(opcode::ADDI, rd, rs, imm)
    }

    /// `add rd, rs, rt`
    pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
        r(opcode::ADD, rd, rs, rt)
    }

    /// `sub rd, rs, rt`
    pub const fn sub(rd: u8, rs: u8, rt: u8) -> u32 {
        r(opcode::SUB, rd, rs, rt)
    }

    /// `mul rd, rs, rt`
    pub const fn mul(rd: u8, rs: u8, rt: u8) -> u32 {
        r(opcode::MUL, rd, rs, rt)
    }

    /// `div rd, rs, rt`
    pub const fn div(rd: u8, rs: u8, rt: u8) -> u32 {
        r(opcode::DIV, rd, rs, rt)
    }

    /// `mfhi rd`
    pub const fn mfhi(rd: u8) -> u32 {
        r(opcode::MFHI, rd, 0, 0)
    }

    /// `fadd fd, fs, ft`
    pub const fn fadd(fd: u8, fs: u8, ft: u8) -> u32 {
        r(opcode::FADD, fd, fs, ft)
    }

    /// `fmul fd, fs, ft`
    pub const fn fmul(fd: u8, fs: u8, ft: u8) -> u32 {
        r(opcode::FMUL, fd, fs, ft)
    }

    /// `fdiv fd, fs, ft`
    pub const fn fdiv(fd: u8, fs: u8, ft: u8) -> u32 {
        r(opcode::FDIV, fd, fs, ft)
    }

    /// `fsqrt fd, fs`
    pub const fn fsqrt(fd: u8, fs: u8) -> u32 {
        r(opcode::FSQRT, fd, fs, 0)
    }

    /// `lw rd, imm(base)`
    pub const fn lw(rd: u8, base: u8, imm: i16) -> u32 {
        i(opcode::LW, rd, base, imm)
    }

    /// `sw rs, imm(base)`
    pub const fn sw(rs: u8, base: u8, imm: i16) -> u32 {
        i(opcode::SW, rs, base, imm)
    }

    /// `beq rs, rt, offset` (offset in instructions from `pc + 4`)
    pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
        i(opcode::BEQ, rs, rt, offset)
    }

    /// `bne rs, rt, offset` (offset in instructions from `pc + 4`)
    pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
        i(opcode::BNE, rs, rt, offset)
    }

    /// `j addr`
    pub const fn j(addr: u32) -> u32 {
        (opcode::J << 26) | ((addr >> 2) & super::super::instruction::TARGET_MASK)
    }

    /// `jal addr`
    pub const fn jal(addr: u32) -> u32 {
        (opcode::JAL << 26) | ((addr >> 2) & super::super::instruction::TARGET_MASK)
    }

    /// `jr rs`
    pub const fn jr(rs: u8) -> u32 {
        r(opcode::JR, rs, 0, 0)
    }
}
