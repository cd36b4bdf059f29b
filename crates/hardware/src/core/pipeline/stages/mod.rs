//! Pipeline stage implementations.
//!
//! Each stage is a free function over a [`Core`](crate::core::cpu::Core). The
//! core calls them once per measured cycle, back to front:
//! 1. **Commit:** Retires from the reorder buffer heads and squashes mispredicted paths.
//! 2. **Writeback:** Produces results and wakes their consumers.
//! 3. **LSQ Refresh:** Admits loads past older stores (memory disambiguation).
//! 4. **Wakeup/Issue:** Moves woken entries to the ready queues and issues them.
//! 5. **Dispatch:** Places renamed entries into the issue queues.
//! 6. **Rename:** Maps decoded instructions onto physical registers.
//! 7. **Fetch:** Reads, executes and predicts instructions into the decode buffer.

/// Commit stage and squash.
pub mod commit;

/// Load/store queue refresh.
pub mod disambiguate;

/// Dispatch stage.
pub mod dispatch;

/// Fetch stage.
pub mod fetch;

/// Wakeup and issue stages.
pub mod issue;

/// Register rename stage.
pub mod rename;

/// Writeback stage.
pub mod writeback;

pub use commit::{commit_stage, squash};
pub use disambiguate::refresh_lsq_stage;
pub use dispatch::dispatch_stage;
pub use fetch::fetch_stage;
pub use issue::{issue_stage, wakeup_stage};
pub use rename::rename_stage;
pub use writeback::writeback_stage;
