//! Point-to-point coherence network.
//!
//! A message of `size` bytes takes `hop_latency + ceil(size / bandwidth)`
//! cycles. Messages on the same (sender, receiver) link arrive in the order
//! they were sent: a message never overtakes an earlier one on its link.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::NetworkConfig;
use crate::soc::coherence::message::NodeId;

/// Traffic counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NetworkStats {
    /// Messages sent.
    pub messages: u64,
    /// Bytes sent.
    pub bytes: u64,
}

/// Latency model plus per-link ordering state.
#[derive(Debug)]
pub struct Network {
    hop_latency: u64,
    bandwidth: u64,
    last_arrival: HashMap<(NodeId, NodeId), u64>,
    /// Traffic counters.
    pub stats: NetworkStats,
}

impl Network {
    /// Creates a network from its configuration.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            hop_latency: config.hop_latency,
            bandwidth: config.bandwidth.max(1),
            last_arrival: HashMap::new(),
            stats: NetworkStats::default(),
        }
    }

    /// Unloaded latency of a `size`-byte message.
    pub const fn latency(&self, size: u64) -> u64 {
        self.hop_latency + size.div_ceil(self.bandwidth)
    }

    /// Books a transfer sent at cycle `now`, delayed by `extra` cycles of
    /// processing at the sender, and returns the delay until delivery.
    pub fn transfer(&mut self, now: u64, from: NodeId, to: NodeId, size: u64, extra: u64) -> u64 {
        self.stats.messages += 1;
        self.stats.bytes += size;

        let earliest = now + extra + self.latency(size);
        let slot = self.last_arrival.entry((from, to)).or_insert(0);
        let arrival = earliest.max(*slot);
        *slot = arrival;
        arrival - now
    }
}
