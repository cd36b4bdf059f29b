//! # Unit Components
//!
//! Tests grouped the way the library is laid out: shared building blocks, the
//! configuration layer, the cores, the instruction set, the simulation driver,
//! the memory system and the statistics report.

/// Ids, the entry arena and the error taxonomy.
pub mod common;

/// Configuration defaults, JSON loading and validation.
pub mod config;

/// Out-of-order pipeline and functional units.
///
/// Includes whole-machine scenarios: commit bandwidth, misprediction recovery,
/// memory disambiguation and the commit watchdog.
pub mod core;
