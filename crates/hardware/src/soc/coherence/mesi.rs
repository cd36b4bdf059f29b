//! Stable-state MSI/MESI transitions of a line in an L1 cache.
//!
//! [`transition`] is the line-local table: given the protocol, a stable state
//! and an event, it yields the next stable state and the messages the line must
//! emit. Transient states are handled by the L1 state machine, which consults
//! this table on entry to and exit from them.

use crate::common::{SimError, SimResult};
use crate::config::Protocol;

/// Stable coherence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stable {
    /// Not present.
    I,
    /// Readable, possibly shared.
    S,
    /// Readable and writable without telling anyone, clean (MESI only).
    E,
    /// Readable and writable, dirty.
    M,
}

/// Event applied to a stable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// Local read; `sharers` tells whether any other cache holds the line.
    Read {
        /// Another cache holds the line.
        sharers: bool,
    },
    /// Local write.
    Write,
    /// The line is chosen as a victim.
    Replacement,
    /// Another cache reads the line.
    ExternalRead,
    /// Another cache writes the line.
    ExternalWrite,
}

/// Side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Tell the directory a clean copy is dropped.
    NotifyDirectory,
    /// Send the dirty line to the directory before dropping it.
    WriteBack,
    /// Send the line to the requesting cache.
    PeerTransfer,
    /// Send the dirty line to the directory while keeping a shared copy.
    CopyBack,
    /// Acknowledge the request.
    Ack,
}

/// Applies `event` to a line in `state` under `protocol`.
///
/// Returns [`SimError::ProtocolViolation`] stamped with `cycle` and
/// `controller` for pairs the table does not define, including any use of `E`
/// under MSI.
pub fn transition(
    protocol: Protocol,
    state: Stable,
    event: LineEvent,
    cycle: u64,
    controller: &str,
) -> SimResult<(Stable, Vec<Action>)> {
    use Action::{Ack, CopyBack, NotifyDirectory, PeerTransfer, WriteBack};
    use LineEvent::{ExternalRead, ExternalWrite, Read, Replacement, Write};
    use Stable::{E, I, M, S};

    let violation = || SimError::protocol(cycle, controller, state, event);

    if state == E && protocol == Protocol::Msi {
        return Err(violation());
    }

    let result = match (state, event) {
        (I, Write) => (M, vec![]),
        (I, Read { sharers: true }) => (S, vec![]),
        (I, Read { sharers: false }) => match protocol {
            Protocol::Mesi => (E, vec![]),
            Protocol::Msi => (S, vec![]),
        },

        (E, Read { .. }) => (E, vec![]),
        (E, Write) => (M, vec![]),
        (E, Replacement) => (I, vec![NotifyDirectory]),
        (E, ExternalRead) => (S, vec![PeerTransfer, Ack]),
        (E, ExternalWrite) => (I, vec![PeerTransfer, Ack]),

        (S, Read { .. }) => (S, vec![]),
        (S, Write) => (M, vec![]),
        (S, Replacement) => (I, vec![NotifyDirectory]),
        (S, ExternalWrite) => (I, vec![Ack]),

        (M, Read { .. } | Write) => (M, vec![]),
        (M, Replacement) => (I, vec![WriteBack]),
        (M, ExternalRead) => (S, vec![PeerTransfer, CopyBack]),
        (M, ExternalWrite) => (I, vec![PeerTransfer, Ack]),

        _ => return Err(violation()),
    };
    Ok(result)
}
