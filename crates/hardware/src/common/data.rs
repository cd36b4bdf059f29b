//! Memory Access Types.
//!
//! This module defines the classification of memory accesses submitted by the
//! pipeline to the cache hierarchy. These types are used for the following:
//! 1. **Port Accounting:** Reads and fetches use read ports, stores use write ports.
//! 2. **Alias Merging:** Same-line accesses merge only when neither is a store.
//! 3. **Statistics Tracking:** Hit and miss counters are kept per access kind.

use serde::Serialize;

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data loads, and data stores
/// when they enter an L1 controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Issued by the fetch stage to the instruction cache.
    Fetch,

    /// Data read access.
    ///
    /// Issued by the load queue when a load leaves the ready-load queue.
    Read,

    /// Data write access.
    ///
    /// Issued by the store queue; requires the line in a writable state.
    Write,
}

impl AccessType {
    /// Returns true for accesses that need write permission on the line.
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}
