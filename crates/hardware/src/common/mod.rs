//! Common utilities and types shared by the pipeline and the coherence engine.
//!
//! This module provides the building blocks used across all components of the
//! simulator. It includes:
//! 1. **Constants:** Instruction size, message sizes, and liveness thresholds.
//! 2. **Memory Access:** Classification of accesses submitted to the cache hierarchy.
//! 3. **Error Handling:** The fatal error taxonomy of a simulation run.
//! 4. **Identifiers:** The simulation-scoped id counter and the generational entry arena.

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types for configuration, protocol, and liveness failures.
pub mod error;

/// Id counter and generational arena.
pub mod ids;

pub use data::AccessType;
pub use error::{SimError, SimResult};
pub use ids::{Arena, Handle, IdCounter};
