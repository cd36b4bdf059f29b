//! Coherence messages exchanged between L1 controllers and the directory.

use crate::common::constants::CONTROL_MESSAGE_SIZE;

/// Endpoint of the coherence network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// L1 controller by id (`2c` is the instruction cache of core `c`, `2c + 1` its data cache).
    L1(usize),
    /// The shared directory controller.
    Directory,
}

/// Message type and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// L1 requests a readable copy.
    GetS,
    /// L1 requests a writable copy.
    GetM,
    /// L1 drops a shared copy.
    PutS,
    /// L1 drops an owned copy; `dirty` lines carry data.
    PutM {
        /// The line was modified.
        dirty: bool,
    },
    /// Directory asks the owner to supply `requester` with a shared copy.
    FwdGetS {
        /// L1 that sent the GetS.
        requester: usize,
    },
    /// Directory asks the owner to hand the line to `requester`.
    FwdGetM {
        /// L1 that sent the GetM.
        requester: usize,
    },
    /// Directory asks a sharer to invalidate and acknowledge to `requester`.
    Inv {
        /// L1 collecting the acknowledgements.
        requester: usize,
    },
    /// Directory takes a line back because its own copy is being replaced.
    Recall,
    /// Line data.
    Data {
        /// Invalidation acknowledgements the receiver must still collect.
        acks: i64,
        /// Under MESI, no other cache holds the line.
        exclusive: bool,
    },
    /// Sharer confirms an invalidation.
    InvAck,
    /// Directory confirms a PutS or PutM.
    PutAck,
    /// L1 confirms a recall; `dirty` acknowledgements carry data.
    RecallAck {
        /// The recalled line was modified.
        dirty: bool,
    },
    /// Former owner updates the directory after serving a FwdGetS.
    CopyBack {
        /// The line was modified.
        dirty: bool,
    },
}

/// A message in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Type and payload.
    pub kind: MessageKind,
    /// Line-aligned address.
    pub tag: u64,
    /// Node that sent the message.
    pub sender: NodeId,
    /// Redelivered after stalling on a transient line.
    pub replayed: bool,
}

impl Message {
    /// Creates a message.
    pub const fn new(kind: MessageKind, tag: u64, sender: NodeId) -> Self {
        Self {
            kind,
            tag,
            sender,
            replayed: false,
        }
    }

    /// Returns true when the message carries a cache line.
    pub const fn carries_data(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::Data { .. }
                | MessageKind::PutM { dirty: true }
                | MessageKind::RecallAck { dirty: true }
                | MessageKind::CopyBack { dirty: true }
        )
    }

    /// Size on the wire for lines of `line_bytes`.
    pub const fn size(&self, line_bytes: u64) -> u64 {
        if self.carries_data() {
            line_bytes + CONTROL_MESSAGE_SIZE
        } else {
            CONTROL_MESSAGE_SIZE
        }
    }

    /// L1 id of the sender, if the sender is an L1.
    pub const fn sender_l1(&self) -> Option<usize> {
        match self.sender {
            NodeId::L1(id) => Some(id),
            NodeId::Directory => None,
        }
    }
}
