//! Memory Controller Tests.
//!
//! Latency models on their own, and the directory's use of whichever
//! controller the hierarchy was built with.

use crate::common::builder::ConfigBuilder;
use crate::common::harness::MemoryDriver;
use crate::common::mocks::{fixed_latency, MockController};
use cmpsim_core::config::{MemoryConfig, MemoryController as ControllerKind};
use cmpsim_core::soc::memory::controller::build;
use cmpsim_core::soc::memory::{DramController, MemoryController, SimpleController};
use mockall::predicate::eq;
use rstest::rstest;

#[test]
fn simple_controller_is_address_independent() {
    let mut simple = SimpleController::new(100);
    assert_eq!(simple.access_latency(0), 100);
    assert_eq!(simple.access_latency(0xdead_beef), 100);
}

#[rstest]
#[case::closed(&[0x1000], 28)]
#[case::row_hit(&[0x1000, 0x17c0], 14)]
#[case::row_conflict(&[0x1000, 0x1800], 42)]
#[case::back_to_first_row(&[0x1000, 0x1800, 0x1000], 42)]
fn dram_latency_of_last_access(#[case] addrs: &[u64], #[case] expected: u64) {
    let mut dram = DramController::new(14, 14, 14);
    let last = addrs.iter().map(|&a| dram.access_latency(a)).last();
    assert_eq!(last, Some(expected));
}

#[test]
fn build_follows_the_configuration() {
    let mut config = MemoryConfig {
        controller: ControllerKind::Simple,
        latency: 55,
        t_cas: 3,
        t_ras: 5,
        t_pre: 7,
    };
    assert_eq!(build(&config).access_latency(0x40), 55);
    config.controller = ControllerKind::Dram;
    let mut dram = build(&config);
    assert_eq!(dram.access_latency(0x40), 8);
    assert_eq!(dram.access_latency(0x80), 3);
}

#[test]
fn directory_asks_the_controller_once_per_fill() {
    let config = ConfigBuilder::new().cores(2).build();
    let mut mock = MockController::new();
    let _ = mock
        .expect_access_latency()
        .with(eq(0x100))
        .times(1)
        .return_const(40_u64);
    let mut driver = MemoryDriver::with_controller(&config, Box::new(mock));

    assert!(driver.load(0, 0x100, 1));
    driver.run_until_idle(10_000).unwrap();
    assert!(driver.load(1, 0x104, 2), "same line, served on chip");
    driver.run_until_idle(10_000).unwrap();

    assert_eq!(driver.memory.directory().stats.memory_reads, 1);
}

#[test]
fn memory_latency_shows_in_the_miss_time() {
    let config = ConfigBuilder::new().build();
    let mut fast = MemoryDriver::with_controller(&config, Box::new(fixed_latency(10)));
    let mut slow = MemoryDriver::with_controller(&config, Box::new(fixed_latency(210)));
    for driver in [&mut fast, &mut slow] {
        assert!(driver.load(0, 0x200, 1));
        driver.run_until_idle(10_000).unwrap();
    }
    let fast_done = fast.completion_of(0, 1).unwrap();
    let slow_done = slow.completion_of(0, 1).unwrap();
    assert_eq!(slow_done - fast_done, 200);
}
