//! Simulation error definitions.
//!
//! This module defines the fatal conditions of a simulation run. It provides:
//! 1. **Configuration Errors:** Invalid geometry or capacity, reported at construction.
//! 2. **Protocol Violations:** A coherence controller received an event its state
//!    machine does not define. This is a modeling defect and aborts the run.
//! 3. **Liveness Failures:** A hardware thread stopped committing instructions.
//! 4. **Register Invariants:** A physical register was moved out of a state that
//!    does not allow the move.
//!
//! Resource exhaustion (full ROB, LSQ, decode buffer, register file, issue queues)
//! is not represented here: stages report it as "cannot proceed this cycle".

use thiserror::Error;

/// Fatal simulation error.
///
/// Every variant aborts the run. Protocol and liveness variants carry the cycle
/// at which the condition was detected.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration describes hardware that cannot be built.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Human-readable description of the rejected setting.
        reason: String,
    },

    /// The configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A controller state machine has no transition for the received event.
    #[error("protocol violation at cycle {cycle}: {controller} in state {state} received {event}")]
    ProtocolViolation {
        /// Cycle at which the event was processed.
        cycle: u64,
        /// Name of the controller (`l1d0`, `dir`, ...).
        controller: String,
        /// Debug rendering of the line state.
        state: String,
        /// Debug rendering of the offending event.
        event: String,
    },

    /// A hardware thread made no forward progress.
    #[error("liveness failure at cycle {cycle}: thread {thread} stalled after {committed} committed instructions")]
    Liveness {
        /// Name of the stalled thread (`c0t1`).
        thread: String,
        /// Cycle at which the watchdog gave up.
        cycle: u64,
        /// Instructions the thread committed before stalling.
        committed: u64,
    },

    /// A physical register was committed, recovered or reclaimed from the wrong state.
    #[error("register invariant broken at cycle {cycle}: {reg} in state {state} cannot {operation}")]
    RegisterState {
        /// Cycle at which the move was attempted.
        cycle: u64,
        /// Register name (`Int p12`).
        reg: String,
        /// State the register was found in.
        state: String,
        /// Attempted move.
        operation: String,
    },

    /// A message or continuation named a line or entry that does not exist.
    #[error("unknown {what} at cycle {cycle}")]
    UnknownTarget {
        /// Description of the missing target.
        what: String,
        /// Cycle at which the lookup failed.
        cycle: u64,
    },
}

impl SimError {
    /// Builds a [`SimError::Config`] from anything printable.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Builds a [`SimError::ProtocolViolation`] from debug renderings of the
    /// state and event.
    pub fn protocol(
        cycle: u64,
        controller: impl Into<String>,
        state: impl std::fmt::Debug,
        event: impl std::fmt::Debug,
    ) -> Self {
        Self::ProtocolViolation {
            cycle,
            controller: controller.into(),
            state: format!("{state:?}"),
            event: format!("{event:?}"),
        }
    }
}

/// Result alias used by every fallible simulator operation.
pub type SimResult<T> = Result<T, SimError>;
