//! Chip-multiprocessor simulator library.
//!
//! This crate implements a cycle-accurate multicore simulator with the following:
//! 1. **Core:** Simultaneous multithreaded out-of-order pipeline (fetch, rename,
//!    dispatch, wakeup/issue, writeback, commit) with speculative squash and
//!    recovery over physical register renaming, a reorder buffer and a
//!    load/store queue with memory disambiguation.
//! 2. **Coherence:** Per-core L1 controllers and a shared directory running the
//!    MSI or MESI protocol with a line lock discipline.
//! 3. **ISA:** A small load/store instruction set and program-backed execution contexts.
//! 4. **Memory:** Replacement policies, memory controllers and the interconnect latency model.
//! 5. **Simulation:** Fast-forward, cache warm-up and measurement phases, configuration,
//!    and statistics collection.

/// Common types and constants (ids, arena, access types, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Processor cores (threads, pipeline, functional units, branch prediction).
pub mod core;
/// Instruction set (decode, execute, execution contexts, programs).
pub mod isa;
/// Event clock, continuations and the simulation driver.
pub mod sim;
/// Memory system (caches, coherence, interconnect, memory controllers).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Fatal simulation error and result alias.
pub use crate::common::{SimError, SimResult};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// One processor core.
pub use crate::core::Core;
/// Program images for the built-in instruction set.
pub use crate::isa::Program;
/// Top-level simulation; construct with `Simulation::new`.
pub use crate::sim::{Phase, Simulation};
/// Collected statistics.
pub use crate::stats::SimStats;
