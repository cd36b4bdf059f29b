//! Instruction Set Architecture (ISA) definitions.
//!
//! The pipeline consumes the ISA only through two seams:
//! 1. [`IsaEngine`]: decodes a machine word and executes a decoded instruction
//!    functionally against an execution context.
//! 2. [`ExecutionContext`]: architectural state of one hardware thread (registers,
//!    memory, pc/npc, speculative mode).
//!
//! A small load/store ISA ([`simple`]) and a program-backed context
//! ([`context::ProgramContext`]) are provided so complete programs can be simulated.

/// Execution context trait and the program-backed implementation.
pub mod context;

/// Instruction fields, static and dynamic instructions.
pub mod instruction;

/// Program images.
pub mod program;

/// The simulated instruction set: decoder, executor and encoders.
pub mod simple;

pub use self::context::{ContextState, ExecutionContext, ProgramContext};
pub use self::instruction::{
    DynamicInstruction, FuOperation, Mnemonic, MnemonicKind, StaticInstruction,
};
pub use self::program::Program;
pub use self::simple::SimpleIsa;

/// Architectural integer registers per thread.
pub const NUM_INT_REGS: usize = 32;
/// Architectural floating-point registers per thread.
pub const NUM_FP_REGS: usize = 32;
/// Architectural miscellaneous registers per thread (the `HI` remainder register).
pub const NUM_MISC_REGS: usize = 1;

/// Integer register written by calls with the return address.
pub const RETURN_ADDRESS_REG: u8 = 31;

/// Dependency class of a register; each class is renamed from its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegClass {
    /// Integer registers.
    Int,
    /// Floating-point registers.
    Fp,
    /// Miscellaneous registers.
    Misc,
}

impl RegClass {
    /// All classes in file order.
    pub const ALL: [Self; 3] = [Self::Int, Self::Fp, Self::Misc];

    /// Number of architectural registers in this class.
    pub const fn arch_count(self) -> usize {
        match self {
            Self::Int => NUM_INT_REGS,
            Self::Fp => NUM_FP_REGS,
            Self::Misc => NUM_MISC_REGS,
        }
    }

    /// Position of this class in [`RegClass::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Int => 0,
            Self::Fp => 1,
            Self::Misc => 2,
        }
    }
}

/// Architectural register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchReg {
    /// Integer register `r<n>`; `r0` reads as zero.
    Int(u8),
    /// Floating-point register `f<n>`.
    Fp(u8),
    /// Miscellaneous register.
    Misc(u8),
}

impl ArchReg {
    /// Dependency class.
    pub const fn class(self) -> RegClass {
        match self {
            Self::Int(_) => RegClass::Int,
            Self::Fp(_) => RegClass::Fp,
            Self::Misc(_) => RegClass::Misc,
        }
    }

    /// Index within the class.
    pub const fn index(self) -> usize {
        match self {
            Self::Int(n) | Self::Fp(n) | Self::Misc(n) => n as usize,
        }
    }

    /// Returns true for the hard-wired integer zero register.
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Int(0))
    }
}

/// Decoder and functional executor of an instruction set.
pub trait IsaEngine: std::fmt::Debug {
    /// Decodes one machine word. Unknown encodings decode as no-ops.
    fn decode(&self, word: u32) -> StaticInstruction;

    /// Executes `inst` against `ctx`, whose pc already names the instruction and
    /// whose npc is the sequential successor. Control instructions redirect npc.
    ///
    /// Returns the effective address of loads and stores.
    fn execute(&self, inst: &StaticInstruction, ctx: &mut dyn ExecutionContext) -> Option<u32>;
}
