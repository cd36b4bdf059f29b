//! Network Tests.

use cmpsim_core::config::NetworkConfig;
use cmpsim_core::soc::coherence::message::NodeId;
use cmpsim_core::soc::interconnect::Network;
use proptest::prelude::*;
use rstest::rstest;

fn network(hop_latency: u64, bandwidth: u64) -> Network {
    Network::new(&NetworkConfig {
        hop_latency,
        bandwidth,
    })
}

#[rstest]
#[case(1, 8, 8, 2)]
#[case(1, 8, 9, 3)]
#[case(4, 16, 72, 9)]
#[case(0, 1, 0, 0)]
fn latency_is_hop_plus_serialization(
    #[case] hop: u64,
    #[case] bandwidth: u64,
    #[case] size: u64,
    #[case] expected: u64,
) {
    assert_eq!(network(hop, bandwidth).latency(size), expected);
}

#[test]
fn zero_bandwidth_is_treated_as_one() {
    assert_eq!(network(1, 0).latency(8), 9);
}

#[test]
fn processing_delay_adds_to_latency() {
    let mut net = network(2, 8);
    assert_eq!(net.transfer(10, NodeId::L1(1), NodeId::Directory, 8, 5), 8);
    assert_eq!(net.stats.messages, 1);
    assert_eq!(net.stats.bytes, 8);
}

#[test]
fn later_sends_after_the_link_drains_are_unloaded() {
    let mut net = network(2, 8);
    assert_eq!(net.transfer(0, NodeId::L1(1), NodeId::Directory, 72, 0), 11);
    assert_eq!(net.transfer(20, NodeId::L1(1), NodeId::Directory, 8, 0), 3);
}

proptest! {
    /// Arrivals on one link are non-decreasing in send order.
    #[test]
    fn per_link_fifo(sends in prop::collection::vec((0u64..4, 1u64..128, 0u64..6), 1..40)) {
        let mut net = network(1, 8);
        let mut now = 0;
        let mut last = 0;
        for (gap, size, extra) in sends {
            now += gap;
            let arrival = now + net.transfer(now, NodeId::Directory, NodeId::L1(3), size, extra);
            prop_assert!(arrival >= last);
            prop_assert!(arrival >= now + net.latency(size) + extra);
            last = arrival;
        }
    }
}
