//! Global Simulation Constants.
//!
//! This module defines constants used across the simulator. It includes:
//! 1. **Instruction Constants:** Instruction word size.
//! 2. **Message Constants:** Sizes of coherence control and data messages.
//! 3. **Liveness Constants:** Commit watchdog thresholds.

/// Size of one instruction word in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Size in bytes of a coherence message that carries no cache line.
///
/// Data messages carry the line plus this header, so their size is
/// `line_size + CONTROL_MESSAGE_SIZE`.
pub const CONTROL_MESSAGE_SIZE: u64 = 8;

/// Default number of cycles without a commit before the watchdog fires.
pub const COMMIT_TIMEOUT: u64 = 1_000_000;

/// Number of watchdog firings tolerated before the run is declared dead.
pub const MAX_COMMIT_STRIKES: u32 = 5;

/// Retry delay used when a request cannot make progress this cycle.
pub const RETRY_DELAY: u64 = 1;
