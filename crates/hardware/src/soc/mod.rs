//! Memory-System Components.
//!
//! This module organizes everything below the cores: the set-associative
//! cache arrays and their replacement policies, the coherence engine (L1
//! controllers and the shared directory), the network that carries coherence
//! messages, the backing memory controller, the per-thread TLBs, and the
//! hierarchy façade the pipeline talks to.

/// Set-associative arrays and replacement policies.
pub mod cache;

/// Directory-based MSI/MESI coherence.
pub mod coherence;

/// Memory hierarchy façade.
pub mod hierarchy;

/// Coherence network latency model.
pub mod interconnect;

/// Memory controller implementations.
pub mod memory;

/// Per-thread instruction and data TLBs.
pub mod tlb;

pub use hierarchy::MemoryHierarchy;
