//! Instruction encoding, static instructions and dynamic instructions.
//!
//! Provides bit extraction for the 32-bit instruction words of the simulated ISA,
//! the decoded [`StaticInstruction`] consumed by the pipeline, and the
//! [`DynamicInstruction`] that tracks one fetched occurrence of it.

use super::ArchReg;

/// Bit position of the opcode field (bits 26-31).
pub const OPCODE_SHIFT: u32 = 26;
/// Bit mask for the opcode field after shifting.
pub const OPCODE_MASK: u32 = 0x3F;
/// Bit mask for a register field after shifting.
pub const REG_MASK: u32 = 0x1F;
/// Bit mask for the 26-bit jump target field.
pub const TARGET_MASK: u32 = 0x03FF_FFFF;

/// Trait for extracting instruction fields from encoded instructions.
///
/// Layout: `op[31:26] a[25:21] b[20:16] c[15:11]`, with a 16-bit immediate in
/// `[15:0]` and a 26-bit jump target in `[25:0]`.
pub trait InstructionBits {
    /// Extracts the 6-bit opcode.
    fn opcode(&self) -> u32;

    /// Extracts register field `a` (destination, or store data / first compare operand).
    fn ra(&self) -> u8;

    /// Extracts register field `b` (first source, or base address).
    fn rb(&self) -> u8;

    /// Extracts register field `c` (second source).
    fn rc(&self) -> u8;

    /// Extracts the sign-extended 16-bit immediate.
    fn imm(&self) -> i32;

    /// Extracts the 26-bit jump target (word index).
    fn target(&self) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        (self >> OPCODE_SHIFT) & OPCODE_MASK
    }

    #[inline(always)]
    fn ra(&self) -> u8 {
        ((self >> 21) & REG_MASK) as u8
    }

    #[inline(always)]
    fn rb(&self) -> u8 {
        ((self >> 16) & REG_MASK) as u8
    }

    #[inline(always)]
    fn rc(&self) -> u8 {
        ((self >> 11) & REG_MASK) as u8
    }

    #[inline(always)]
    fn imm(&self) -> i32 {
        i32::from(*self as u16 as i16)
    }

    #[inline(always)]
    fn target(&self) -> u32 {
        self & TARGET_MASK
    }
}

/// Operation class used to pick a functional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum FuOperation {
    /// Integer add, compare, logic.
    IntAlu,
    /// Integer multiply.
    IntMult,
    /// Integer divide.
    IntDiv,
    /// Floating-point add or subtract.
    FpAdd,
    /// Floating-point multiply.
    FpMult,
    /// Floating-point divide.
    FpDiv,
    /// Floating-point square root.
    FpSqrt,
    /// Load effective-address computation.
    ReadPort,
    /// Store effective-address computation.
    WritePort,
}

/// Control and memory behaviour of a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MnemonicKind {
    /// Computes a value; no control or memory effect.
    Plain,
    /// Reads memory.
    Load,
    /// Writes memory.
    Store,
    /// Conditional branch.
    Conditional,
    /// Unconditional jump (direct or indirect, not a call or return).
    Unconditional,
    /// Jump that pushes a return address.
    FunctionCall,
    /// Jump through the return-address register.
    FunctionReturn,
    /// Does nothing; skipped by fetch.
    Nop,
}

/// Decoded operation: name, behaviour class and functional-unit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mnemonic {
    /// Assembly name.
    pub name: &'static str,
    /// Behaviour class.
    pub kind: MnemonicKind,
    /// Functional unit operation, or `None` if the instruction completes at issue.
    pub fu_op: Option<FuOperation>,
}

impl Mnemonic {
    /// Returns true for branches, jumps, calls and returns.
    #[inline]
    pub const fn is_control(&self) -> bool {
        matches!(
            self.kind,
            MnemonicKind::Conditional
                | MnemonicKind::Unconditional
                | MnemonicKind::FunctionCall
                | MnemonicKind::FunctionReturn
        )
    }

    /// Returns true for loads and stores.
    #[inline]
    pub const fn is_memory(&self) -> bool {
        matches!(self.kind, MnemonicKind::Load | MnemonicKind::Store)
    }
}

/// One decoded machine word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInstruction {
    /// Raw encoding.
    pub word: u32,
    /// Decoded operation.
    pub mnemonic: Mnemonic,
    /// Source registers. For memory instructions `inputs[0]` is the address base.
    pub inputs: Vec<ArchReg>,
    /// Destination registers.
    pub outputs: Vec<ArchReg>,
}

impl StaticInstruction {
    /// Returns true if fetch should skip this instruction.
    #[inline]
    pub const fn is_nop(&self) -> bool {
        matches!(self.mnemonic.kind, MnemonicKind::Nop)
    }

    /// Returns true for loads.
    #[inline]
    pub const fn is_load(&self) -> bool {
        matches!(self.mnemonic.kind, MnemonicKind::Load)
    }

    /// Returns true for stores.
    #[inline]
    pub const fn is_store(&self) -> bool {
        matches!(self.mnemonic.kind, MnemonicKind::Store)
    }
}

/// One fetched occurrence of a static instruction.
#[derive(Debug, Clone)]
pub struct DynamicInstruction {
    /// Simulation-scoped id.
    pub id: u64,
    /// Program counter.
    pub pc: u32,
    /// Decoded instruction.
    pub inst: StaticInstruction,
    /// Effective address computed at fetch for loads and stores.
    pub effective_address: Option<u32>,
    /// Cycles this instruction has spent incomplete at the ROB head.
    pub cycles_at_head: u64,
}

impl DynamicInstruction {
    /// Wraps a decoded and executed instruction.
    pub const fn new(
        id: u64,
        pc: u32,
        inst: StaticInstruction,
        effective_address: Option<u32>,
    ) -> Self {
        Self {
            id,
            pc,
            inst,
            effective_address,
            cycles_at_head: 0,
        }
    }
}
