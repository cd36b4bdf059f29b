//! Core processor implementation.
//!
//! This module contains the simultaneous multithreaded out-of-order core: the
//! per-cycle orchestrator, the hardware threads, the instruction pipeline and
//! the execution units (functional units and branch predictors).

/// Core definition and per-cycle orchestration.
pub mod cpu;

/// Out-of-order pipeline (register files, ROB/LSQ, stages).
pub mod pipeline;

/// Hardware thread state.
pub mod thread;

/// Execution units (functional units, branch predictors).
pub mod units;

pub use self::cpu::Core;
pub use self::thread::{Thread, ThreadRole, ThreadState};
