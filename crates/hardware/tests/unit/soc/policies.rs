//! Replacement Policy Tests.

use cmpsim_core::config::ReplacementPolicy;
use cmpsim_core::soc::cache::policies::build;
use rstest::rstest;

const WAYS: usize = 4;

fn victim_after(kind: ReplacementPolicy, touches: &[usize]) -> usize {
    let mut policy = build(kind, 2, WAYS);
    for &way in touches {
        policy.update(0, way);
    }
    policy.get_victim(0)
}

#[rstest]
#[case::lru_untouched(ReplacementPolicy::Lru, &[], 3)]
#[case::lru_oldest(ReplacementPolicy::Lru, &[3, 2, 1, 0, 2], 3)]
#[case::lru_retouch(ReplacementPolicy::Lru, &[0, 1, 2, 3, 0], 1)]
#[case::mru_latest(ReplacementPolicy::Mru, &[0, 1, 2], 2)]
#[case::mru_retouch(ReplacementPolicy::Mru, &[2, 1, 2], 2)]
#[case::fifo_untouched(ReplacementPolicy::Fifo, &[], 0)]
#[case::fifo_fills(ReplacementPolicy::Fifo, &[0, 1], 2)]
#[case::fifo_ignores_hits(ReplacementPolicy::Fifo, &[0, 3, 3], 1)]
#[case::plru_first_clear(ReplacementPolicy::Plru, &[0, 1, 2], 3)]
#[case::plru_reset(ReplacementPolicy::Plru, &[0, 1, 2, 3], 0)]
#[case::plru_after_reset(ReplacementPolicy::Plru, &[0, 1, 2, 3, 0], 1)]
fn victim_selection(#[case] kind: ReplacementPolicy, #[case] touches: &[usize], #[case] expected: usize) {
    assert_eq!(victim_after(kind, touches), expected);
}

#[test]
fn sets_are_tracked_independently() {
    let mut policy = build(ReplacementPolicy::Lru, 2, WAYS);
    for way in [3, 2, 1] {
        policy.update(0, way);
    }
    assert_eq!(policy.get_victim(0), 0);
    assert_eq!(policy.get_victim(1), 3, "untouched set keeps its initial order");
}

#[test]
fn random_victims_stay_in_range() {
    let mut policy = build(ReplacementPolicy::Random, 1, WAYS);
    let victims: Vec<_> = (0..64).map(|_| policy.get_victim(0)).collect();
    assert!(victims.iter().all(|&v| v < WAYS));
    assert!(victims.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn random_sequence_is_reproducible() {
    let mut a = build(ReplacementPolicy::Random, 1, WAYS);
    let mut b = build(ReplacementPolicy::Random, 1, WAYS);
    for _ in 0..16 {
        assert_eq!(a.get_victim(0), b.get_victim(0));
    }
}
