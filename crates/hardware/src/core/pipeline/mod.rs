//! Out-of-order instruction pipeline.
//!
//! This module contains the structures instructions flow through between fetch
//! and commit. It includes:
//! 1. **Register Files:** Physical registers with their rename lifecycle and
//!    the consumers waiting on them.
//! 2. **Queues:** The reorder buffer and the load/store queue.
//! 3. **Stages:** Commit, writeback, LSQ refresh, wakeup, issue, dispatch,
//!    rename and fetch.

/// Physical register files.
pub mod regfile;

/// Reorder buffer and load/store queue.
pub mod rob;

/// Pipeline stage implementations.
pub mod stages;
