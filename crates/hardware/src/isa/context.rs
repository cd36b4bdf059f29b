//! Execution contexts.
//!
//! An execution context is the architectural state of one hardware thread. Fetch
//! executes instructions functionally against it as they are fetched, so the
//! context runs ahead of the timing pipeline. When fetch follows a predicted path
//! that differs from the executed one, the context enters speculative state; the
//! state at that moment is restored when the pipeline exits speculation after a
//! squash.

use std::collections::HashMap;

use super::{ArchReg, NUM_FP_REGS, NUM_INT_REGS, NUM_MISC_REGS, Program};
use crate::common::constants::INSTRUCTION_SIZE;

/// Lifecycle of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Instructions remain to be fetched.
    Running,
    /// The program ended or the context was killed.
    Finished,
}

/// Architectural state seen by the ISA executor and the fetch stage.
pub trait ExecutionContext: std::fmt::Debug {
    /// Address of the instruction being executed.
    fn pc(&self) -> u32;

    /// Address of the next instruction to execute.
    fn npc(&self) -> u32;

    /// Redirects the next instruction address.
    fn set_npc(&mut self, npc: u32);

    /// Moves to the next instruction: `pc <- npc`, `npc <- pc + 4`. Returns the new pc.
    fn step(&mut self) -> u32;

    /// Current lifecycle state.
    fn state(&self) -> ContextState;

    /// Returns true while fetch is following a path that differs from execution.
    fn is_speculative(&self) -> bool;

    /// Snapshots architectural state and starts buffering speculative effects.
    fn enter_speculative_state(&mut self);

    /// Discards speculative effects and restores the snapshot.
    fn exit_speculative_state(&mut self);

    /// Reads a register.
    fn read_reg(&self, reg: ArchReg) -> u32;

    /// Writes a register. Writes to the integer zero register are dropped.
    fn write_reg(&mut self, reg: ArchReg, value: u32);

    /// Reads the aligned word containing `addr`.
    fn read_mem(&self, addr: u32) -> u32;

    /// Writes the aligned word containing `addr`.
    fn write_mem(&mut self, addr: u32, value: u32);

    /// Reads the instruction word at `pc`.
    fn fetch_word(&self, pc: u32) -> u32;

    /// Returns true if `pc` addresses an instruction of the loaded program.
    fn contains_pc(&self, pc: u32) -> bool;

    /// Ends the context from outside the pipeline.
    fn kill(&mut self);
}

#[derive(Debug, Clone)]
struct Registers {
    int: [u32; NUM_INT_REGS],
    fp: [u32; NUM_FP_REGS],
    misc: [u32; NUM_MISC_REGS],
}

impl Registers {
    fn slot(&mut self, reg: ArchReg) -> Option<&mut u32> {
        match reg {
            ArchReg::Int(n) => self.int.get_mut(n as usize),
            ArchReg::Fp(n) => self.fp.get_mut(n as usize),
            ArchReg::Misc(n) => self.misc.get_mut(n as usize),
        }
    }

    fn value(&self, reg: ArchReg) -> u32 {
        let v = match reg {
            ArchReg::Int(n) => self.int.get(n as usize),
            ArchReg::Fp(n) => self.fp.get(n as usize),
            ArchReg::Misc(n) => self.misc.get(n as usize),
        };
        v.copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    regs: Registers,
    pc: u32,
    npc: u32,
}

/// Context backed by a [`Program`] image and a sparse word memory.
#[derive(Debug, Clone)]
pub struct ProgramContext {
    program: Program,
    regs: Registers,
    memory: HashMap<u32, u32>,
    speculative_memory: HashMap<u32, u32>,
    snapshot: Option<Snapshot>,
    pc: u32,
    npc: u32,
    killed: bool,
}

impl ProgramContext {
    /// Loads `program`; the first fetched instruction is at its text base.
    pub fn new(program: Program) -> Self {
        let memory = program.data.iter().map(|&(a, v)| (a & !3, v)).collect();
        let base = program.text_base;
        Self {
            program,
            regs: Registers {
                int: [0; NUM_INT_REGS],
                fp: [0; NUM_FP_REGS],
                misc: [0; NUM_MISC_REGS],
            },
            memory,
            speculative_memory: HashMap::new(),
            snapshot: None,
            pc: base.wrapping_sub(INSTRUCTION_SIZE),
            npc: base,
            killed: false,
        }
    }

    /// The loaded program.
    pub const fn program(&self) -> &Program {
        &self.program
    }
}

impl ExecutionContext for ProgramContext {
    fn pc(&self) -> u32 {
        self.pc
    }

    fn npc(&self) -> u32 {
        self.npc
    }

    fn set_npc(&mut self, npc: u32) {
        self.npc = npc;
    }

    fn step(&mut self) -> u32 {
        self.pc = self.npc;
        self.npc = self.pc.wrapping_add(INSTRUCTION_SIZE);
        self.pc
    }

    fn state(&self) -> ContextState {
        if self.killed || (self.snapshot.is_none() && !self.program.contains(self.npc)) {
            ContextState::Finished
        } else {
            ContextState::Running
        }
    }

    fn is_speculative(&self) -> bool {
        self.snapshot.is_some()
    }

    fn enter_speculative_state(&mut self) {
        if self.snapshot.is_none() {
            self.snapshot = Some(Snapshot {
                regs: self.regs.clone(),
                pc: self.pc,
                npc: self.npc,
            });
        }
    }

    fn exit_speculative_state(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.regs = snapshot.regs;
            self.pc = snapshot.pc;
            self.npc = snapshot.npc;
            self.speculative_memory.clear();
        }
    }

    fn read_reg(&self, reg: ArchReg) -> u32 {
        if reg.is_zero() { 0 } else { self.regs.value(reg) }
    }

    fn write_reg(&mut self, reg: ArchReg, value: u32) {
        if reg.is_zero() {
            return;
        }
        if let Some(slot) = self.regs.slot(reg) {
            *slot = value;
        }
    }

    fn read_mem(&self, addr: u32) -> u32 {
        let addr = addr & !3;
        if self.snapshot.is_some() {
            if let Some(&v) = self.speculative_memory.get(&addr) {
                return v;
            }
        }
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    fn write_mem(&mut self, addr: u32, value: u32) {
        let addr = addr & !3;
        let target = if self.snapshot.is_some() {
            &mut self.speculative_memory
        } else {
            &mut self.memory
        };
        let _ = target.insert(addr, value);
    }

    fn fetch_word(&self, pc: u32) -> u32 {
        if self.program.contains(pc) {
            let index = ((pc - self.program.text_base) / INSTRUCTION_SIZE) as usize;
            self.program.text.get(index).copied().unwrap_or(0)
        } else {
            0
        }
    }

    fn contains_pc(&self, pc: u32) -> bool {
        self.program.contains(pc)
    }

    fn kill(&mut self) {
        self.killed = true;
    }
}
