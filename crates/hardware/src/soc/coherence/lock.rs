//! Per-line lock used to serialize L1 transactions.
//!
//! A line runs at most one hit, evict or fill transaction at a time. Requests
//! that find the line locked are parked on the line and replayed after it is
//! unlocked.

use crate::common::{SimError, SimResult};

/// Lock state of an L1 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockState {
    /// Holds nothing.
    #[default]
    Invalid,
    /// Holds a line in a stable coherence state.
    Valid,
    /// A hit (or permission upgrade) is in progress.
    Hitting,
    /// The line is being written back or dropped.
    Evicting,
    /// Eviction finished; the way is reserved for the fill that follows.
    Evicted,
    /// A miss is being filled.
    Filling,
}

/// Lock transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    /// Start a hit.
    BeginHit,
    /// Finish a hit.
    EndHit,
    /// Start an eviction.
    BeginEvict,
    /// Finish an eviction.
    EndEvict,
    /// Start a fill.
    BeginFill,
    /// Finish a fill.
    EndFill,
    /// The line was invalidated by the directory.
    Invalidate,
}

impl LockState {
    /// Returns true while a transaction owns the line.
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Hitting | Self::Evicting | Self::Evicted | Self::Filling)
    }

    /// Applies `event`.
    ///
    /// Any transition not listed below is a protocol violation:
    ///
    /// | From | Event | To |
    /// |---|---|---|
    /// | Invalid, Evicted | BeginFill | Filling |
    /// | Filling | EndFill | Valid |
    /// | Valid | BeginHit | Hitting |
    /// | Hitting | EndHit | Valid |
    /// | Valid | BeginEvict | Evicting |
    /// | Evicting | EndEvict | Evicted |
    /// | Valid | Invalidate | Invalid |
    /// | Hitting | Invalidate | Filling |
    pub fn apply(self, event: LockEvent, cycle: u64, controller: &str) -> SimResult<Self> {
        use LockEvent::{BeginEvict, BeginFill, BeginHit, EndEvict, EndFill, EndHit, Invalidate};

        match (self, event) {
            (Self::Invalid | Self::Evicted, BeginFill) => Ok(Self::Filling),
            (Self::Filling, EndFill) => Ok(Self::Valid),
            (Self::Valid, BeginHit) => Ok(Self::Hitting),
            (Self::Hitting, EndHit) => Ok(Self::Valid),
            (Self::Valid, BeginEvict) => Ok(Self::Evicting),
            (Self::Evicting, EndEvict) => Ok(Self::Evicted),
            (Self::Valid, Invalidate) => Ok(Self::Invalid),
            (Self::Hitting, Invalidate) => Ok(Self::Filling),
            _ => Err(SimError::protocol(cycle, controller, self, event)),
        }
    }
}
