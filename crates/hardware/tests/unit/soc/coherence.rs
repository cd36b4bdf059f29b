//! Coherence Tests.
//!
//! Verifies the stable-state MSI/MESI table, the line lock discipline and whole
//! protocol runs through the L1 controllers and the directory. L1 controller
//! ids interleave per core: `2c` is the instruction cache of core `c` and
//! `2c + 1` its data cache.

use crate::common::builder::ConfigBuilder;
use crate::common::harness::MemoryDriver;
use cmpsim_core::config::{Config, Protocol, ReplacementPolicy};
use cmpsim_core::soc::coherence::directory::DirState;
use cmpsim_core::soc::coherence::l1::L1State;
use cmpsim_core::soc::coherence::lock::{LockEvent, LockState};
use cmpsim_core::soc::coherence::mesi::{transition, Action, LineEvent, Stable};
use pretty_assertions::assert_eq;
use rstest::rstest;

const ADDR: u32 = 0x100;

fn l1d(core: usize) -> usize {
    2 * core + 1
}

fn two_cores(protocol: Protocol) -> Config {
    ConfigBuilder::new().cores(2).protocol(protocol).build()
}

// ══════════════════════════════════════════════════════════
// 1. Stable-State Table
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(Protocol::Mesi, Stable::I, LineEvent::Read { sharers: false }, Stable::E, vec![])]
#[case(Protocol::Msi, Stable::I, LineEvent::Read { sharers: false }, Stable::S, vec![])]
#[case(Protocol::Mesi, Stable::I, LineEvent::Read { sharers: true }, Stable::S, vec![])]
#[case(Protocol::Msi, Stable::I, LineEvent::Write, Stable::M, vec![])]
#[case(Protocol::Mesi, Stable::E, LineEvent::Write, Stable::M, vec![])]
#[case(Protocol::Mesi, Stable::E, LineEvent::Replacement, Stable::I, vec![Action::NotifyDirectory])]
#[case(Protocol::Mesi, Stable::E, LineEvent::ExternalRead, Stable::S, vec![Action::PeerTransfer, Action::Ack])]
#[case(Protocol::Msi, Stable::S, LineEvent::Write, Stable::M, vec![])]
#[case(Protocol::Msi, Stable::S, LineEvent::ExternalWrite, Stable::I, vec![Action::Ack])]
#[case(Protocol::Msi, Stable::M, LineEvent::Replacement, Stable::I, vec![Action::WriteBack])]
#[case(Protocol::Msi, Stable::M, LineEvent::ExternalRead, Stable::S, vec![Action::PeerTransfer, Action::CopyBack])]
#[case(Protocol::Mesi, Stable::M, LineEvent::ExternalWrite, Stable::I, vec![Action::PeerTransfer, Action::Ack])]
fn stable_transitions(
    #[case] protocol: Protocol,
    #[case] from: Stable,
    #[case] event: LineEvent,
    #[case] to: Stable,
    #[case] actions: Vec<Action>,
) {
    let (next, emitted) = transition(protocol, from, event, 9, "l1d0").unwrap();
    assert_eq!(next, to);
    assert_eq!(emitted, actions);
}

#[rstest]
#[case(Protocol::Msi, Stable::E, LineEvent::Read { sharers: false })]
#[case(Protocol::Mesi, Stable::I, LineEvent::Replacement)]
#[case(Protocol::Mesi, Stable::I, LineEvent::ExternalRead)]
#[case(Protocol::Msi, Stable::S, LineEvent::ExternalRead)]
fn undefined_transitions_are_violations(
    #[case] protocol: Protocol,
    #[case] from: Stable,
    #[case] event: LineEvent,
) {
    let err = transition(protocol, from, event, 9, "l1d0").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("protocol violation at cycle 9: l1d0"), "got {message}");
}

// ══════════════════════════════════════════════════════════
// 2. Line Locks
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(LockState::Invalid, LockEvent::BeginFill, LockState::Filling)]
#[case(LockState::Evicted, LockEvent::BeginFill, LockState::Filling)]
#[case(LockState::Filling, LockEvent::EndFill, LockState::Valid)]
#[case(LockState::Valid, LockEvent::BeginHit, LockState::Hitting)]
#[case(LockState::Hitting, LockEvent::EndHit, LockState::Valid)]
#[case(LockState::Valid, LockEvent::BeginEvict, LockState::Evicting)]
#[case(LockState::Evicting, LockEvent::EndEvict, LockState::Evicted)]
#[case(LockState::Valid, LockEvent::Invalidate, LockState::Invalid)]
#[case(LockState::Hitting, LockEvent::Invalidate, LockState::Filling)]
fn lock_transitions(#[case] from: LockState, #[case] event: LockEvent, #[case] to: LockState) {
    assert_eq!(from.apply(event, 7, "l1d0").unwrap(), to);
}

#[rstest]
#[case(LockState::Invalid, LockEvent::BeginHit)]
#[case(LockState::Filling, LockEvent::BeginEvict)]
#[case(LockState::Evicting, LockEvent::BeginFill)]
#[case(LockState::Valid, LockEvent::EndFill)]
fn illegal_lock_transitions_name_the_controller(#[case] from: LockState, #[case] event: LockEvent) {
    let err = from.apply(event, 7, "l1d0").unwrap_err();
    assert!(err.to_string().contains("l1d0"), "got {err}");
}

#[test]
fn only_stable_lock_states_are_unlocked() {
    assert!(!LockState::Invalid.is_locked());
    assert!(!LockState::Valid.is_locked());
    for s in [LockState::Hitting, LockState::Evicting, LockState::Evicted, LockState::Filling] {
        assert!(s.is_locked(), "{s:?}");
    }
}

// ══════════════════════════════════════════════════════════
// 3. Protocol Runs
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(Protocol::Mesi, L1State::E)]
#[case(Protocol::Msi, L1State::S)]
fn lone_reader_state(#[case] protocol: Protocol, #[case] expected: L1State) {
    let mut driver = MemoryDriver::new(&two_cores(protocol));
    assert!(driver.load(0, ADDR, 1));
    driver.run_until_idle(10_000).unwrap();

    let l1 = driver.memory.l1d(0).unwrap();
    let tag = l1.tag_of(u64::from(ADDR));
    assert_eq!(l1.state_of(tag), expected);
    assert_eq!(l1.lock_of(tag), LockState::Valid);
    assert!(driver.completion_of(0, 1).is_some());

    let dir = driver.memory.directory();
    assert_eq!(dir.stats.memory_reads, 1);
    match protocol {
        Protocol::Mesi => {
            assert_eq!(dir.state_of(tag), DirState::M);
            assert_eq!(dir.owner_of(tag), Some(l1d(0)));
        }
        Protocol::Msi => {
            assert_eq!(dir.state_of(tag), DirState::S);
            assert_eq!(dir.sharers_of(tag), vec![l1d(0)]);
        }
    }
    driver.memory.check_invariants(0).unwrap();
}

#[rstest]
#[case(Protocol::Mesi)]
#[case(Protocol::Msi)]
fn second_reader_shares_the_line(#[case] protocol: Protocol) {
    let mut driver = MemoryDriver::new(&two_cores(protocol));
    assert!(driver.load(0, ADDR, 1));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(1, ADDR, 2));
    driver.run_until_idle(10_000).unwrap();

    let tag = driver.memory.l1d(0).unwrap().tag_of(u64::from(ADDR));
    for core in 0..2 {
        assert_eq!(driver.memory.l1d(core).unwrap().state_of(tag), L1State::S, "core {core}");
    }
    let dir = driver.memory.directory();
    assert_eq!(dir.state_of(tag), DirState::S);
    assert_eq!(dir.owner_of(tag), None);
    assert_eq!(dir.sharers_of(tag), vec![l1d(0), l1d(1)]);
    driver.memory.check_invariants(0).unwrap();
}

/// Two cores store to the same line in the same cycle. The directory
/// serializes the requests: core 0 is ordered first, then its copy is taken
/// by core 1.
#[rstest]
#[case(Protocol::Mesi)]
#[case(Protocol::Msi)]
fn simultaneous_stores_serialize(#[case] protocol: Protocol) {
    let mut driver = MemoryDriver::new(&two_cores(protocol));
    assert!(driver.store(0, ADDR, 1));
    assert!(driver.store(1, ADDR, 2));
    driver.run_until_idle(10_000).unwrap();

    let first = driver.completion_of(0, 1).expect("core 0 store completes");
    let second = driver.completion_of(1, 2).expect("core 1 store completes");
    assert!(first < second, "core 0 is ordered first ({first} vs {second})");

    let tag = driver.memory.l1d(0).unwrap().tag_of(u64::from(ADDR));
    let dir = driver.memory.directory();
    assert_eq!(dir.state_of(tag), DirState::M);
    assert_eq!(dir.owner_of(tag), Some(l1d(1)));
    assert!(dir.sharers_of(tag).is_empty());
    assert_eq!(driver.memory.l1d(1).unwrap().state_of(tag), L1State::M);
    assert_eq!(driver.memory.l1d(0).unwrap().state_of(tag), L1State::I);
    assert_eq!(dir.stats.get_m, 2, "a stalled request is counted once");
    assert_eq!(dir.stats.stalled_requests, 1);
    assert_eq!((dir.stats.misses, dir.stats.hits), (1, 1));
    assert_eq!(dir.stats.memory_reads, 1, "the second writer is served by the owner");
    driver.memory.check_invariants(0).unwrap();
}

#[test]
fn writer_invalidates_sharers() {
    let mut driver = MemoryDriver::new(&two_cores(Protocol::Msi));
    assert!(driver.load(0, ADDR, 1));
    assert!(driver.load(1, ADDR, 2));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.store(0, ADDR, 3));
    driver.run_until_idle(10_000).unwrap();

    let tag = driver.memory.l1d(0).unwrap().tag_of(u64::from(ADDR));
    assert_eq!(driver.memory.l1d(0).unwrap().state_of(tag), L1State::M);
    assert_eq!(driver.memory.l1d(1).unwrap().state_of(tag), L1State::I);
    assert_eq!(driver.memory.l1d(1).unwrap().stats.invalidations, 1);
    assert_eq!(driver.memory.directory().owner_of(tag), Some(l1d(0)));
    driver.memory.check_invariants(0).unwrap();
}

#[test]
fn conflicting_fill_evicts_the_dirty_line() {
    let mut config = two_cores(Protocol::Mesi);
    config.cache.l1d.size_bytes = 2 * config.cache.l1d.line_bytes;
    config.cache.l1d.ways = 1;
    let stride = 2 * config.cache.l1d.line_bytes as u32;

    let mut driver = MemoryDriver::new(&config);
    assert!(driver.store(0, ADDR, 1));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(0, ADDR + stride, 2));
    driver.run_until_idle(10_000).unwrap();

    let l1 = driver.memory.l1d(0).unwrap();
    let old = l1.tag_of(u64::from(ADDR));
    let new = l1.tag_of(u64::from(ADDR + stride));
    assert_eq!(l1.stats.evictions, 1);
    assert_eq!(l1.state_of(old), L1State::I);
    assert_eq!(l1.state_of(new), L1State::E);
    assert_eq!(l1.occupancy(), 1);

    let dir = driver.memory.directory();
    assert_eq!(dir.owner_of(old), None);
    assert_eq!(dir.stats.memory_writes, 1, "dirty victim written back");
    driver.memory.check_invariants(0).unwrap();
}

// ══════════════════════════════════════════════════════════
// 4. Directory Bookkeeping
// ══════════════════════════════════════════════════════════

/// A directory holding two lines in a single LRU set.
fn tiny_directory(protocol: Protocol) -> Config {
    let mut config = two_cores(protocol);
    config.cache.l2.size_bytes = 2 * config.cache.l2.line_bytes;
    config.cache.l2.ways = 2;
    config.cache.l2.policy = ReplacementPolicy::Lru;
    config
}

#[rstest]
#[case(Protocol::Mesi)]
#[case(Protocol::Msi)]
fn directory_recalls_least_recently_used_line(#[case] protocol: Protocol) {
    let config = tiny_directory(protocol);
    let line = config.cache.l2.line_bytes as u32;
    let (a, b, c) = (0, line, 2 * line);
    let mut driver = MemoryDriver::new(&config);

    assert!(driver.load(0, a, 1));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(0, b, 2));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(1, b, 3));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(1, c, 4));
    driver.run_until_idle(10_000).unwrap();

    let dir = driver.memory.directory();
    let (a, b, c) = (u64::from(a), u64::from(b), u64::from(c));
    assert_eq!(dir.stats.recalls, 1);
    assert_eq!(dir.state_of(a), DirState::I, "A was least recently used");
    assert_eq!(dir.state_of(b), DirState::S);
    assert_eq!(dir.sharers_of(b), vec![l1d(0), l1d(1)]);
    assert_ne!(dir.state_of(c), DirState::I);
    assert_eq!(driver.memory.l1d(0).unwrap().state_of(a), L1State::I);
    assert!(driver.completion_of(1, 4).is_some());
    driver.memory.check_invariants(0).unwrap();
}

#[test]
fn recall_records_its_victim_until_acknowledged() {
    let config = tiny_directory(Protocol::Mesi);
    let line = config.cache.l2.line_bytes as u32;
    let mut driver = MemoryDriver::new(&config);
    assert!(driver.store(0, 0, 1));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(0, line, 2));
    driver.run_until_idle(10_000).unwrap();

    assert!(driver.load(1, 2 * line, 3));
    let recalling = driver
        .run_until(10_000, |memory| memory.directory().state_of(0) == DirState::MiA)
        .unwrap();
    assert!(recalling, "the owned line is recalled");
    assert_eq!(driver.memory.directory().victim_of(0), Some(0));

    driver.run_until_idle(10_000).unwrap();
    let dir = driver.memory.directory();
    assert_eq!(dir.state_of(0), DirState::I);
    assert_eq!(dir.victim_of(0), None);
    assert_eq!(dir.stats.memory_writes, 1, "the recalled line was dirty");
    assert!(dir.stats.writeback_cycles > 0);
}

#[rstest]
#[case(Protocol::Mesi)]
#[case(Protocol::Msi)]
fn writer_marks_the_line_dirty_until_copied_back(#[case] protocol: Protocol) {
    let mut driver = MemoryDriver::new(&two_cores(protocol));
    assert!(driver.store(0, ADDR, 1));
    driver.run_until_idle(10_000).unwrap();
    let tag = driver.memory.l1d(0).unwrap().tag_of(u64::from(ADDR));
    assert!(driver.memory.directory().is_dirty(tag));

    assert!(driver.load(1, ADDR, 2));
    driver.run_until_idle(10_000).unwrap();
    let dir = driver.memory.directory();
    assert_eq!(dir.state_of(tag), DirState::S);
    assert!(!dir.is_dirty(tag), "shared lines are clean");
    assert_eq!(dir.stats.memory_writes, 1);
    driver.memory.check_invariants(0).unwrap();
}

#[test]
fn exclusive_grant_is_clean() {
    let mut driver = MemoryDriver::new(&two_cores(Protocol::Mesi));
    assert!(driver.load(0, ADDR, 1));
    driver.run_until_idle(10_000).unwrap();
    let tag = driver.memory.l1d(0).unwrap().tag_of(u64::from(ADDR));
    assert_eq!(driver.memory.directory().state_of(tag), DirState::M);
    assert!(!driver.memory.directory().is_dirty(tag));
}
