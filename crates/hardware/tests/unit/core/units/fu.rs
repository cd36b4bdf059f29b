//! Functional Unit Tests.

use cmpsim_core::config::FuConfig;
use cmpsim_core::core::units::fu::{FuKind, FuPool, timing};
use cmpsim_core::isa::FuOperation;
use rstest::rstest;

#[rstest]
#[case(FuOperation::IntAlu, FuKind::IntAlu, 2, 1)]
#[case(FuOperation::IntMult, FuKind::IntMultDiv, 3, 1)]
#[case(FuOperation::IntDiv, FuKind::IntMultDiv, 20, 19)]
#[case(FuOperation::FpAdd, FuKind::FpAdder, 4, 1)]
#[case(FuOperation::FpMult, FuKind::FpMultDiv, 8, 1)]
#[case(FuOperation::FpDiv, FuKind::FpMultDiv, 40, 20)]
#[case(FuOperation::FpSqrt, FuKind::FpMultDiv, 80, 40)]
#[case(FuOperation::ReadPort, FuKind::MemoryPort, 1, 1)]
#[case(FuOperation::WritePort, FuKind::MemoryPort, 1, 1)]
fn latency_table(
    #[case] op: FuOperation,
    #[case] kind: FuKind,
    #[case] operation: u64,
    #[case] issue: u64,
) {
    assert_eq!(timing(op), (kind, operation, issue));
}

#[test]
fn grants_carry_the_operation_timing() {
    let mut fu = FuPool::new(&FuConfig::default());
    let grant = fu.acquire(FuOperation::FpDiv).unwrap();
    assert_eq!(grant.kind, FuKind::FpMultDiv);
    assert_eq!(grant.operation_latency, 40);
    assert_eq!(grant.issue_latency, 20);
    assert_eq!(fu.busy(FuKind::FpMultDiv), 1);
}

#[test]
fn pool_size_bounds_concurrent_grants() {
    let mut fu = FuPool::new(&FuConfig::default());
    let per_kind = FuConfig::default().int_mult_div;
    let grants: Vec<_> = (0..per_kind)
        .map(|_| fu.acquire(FuOperation::IntDiv).unwrap())
        .collect();
    assert!(fu.acquire(FuOperation::IntMult).is_none());
    assert!(fu.acquire(FuOperation::IntDiv).is_none());
    assert_eq!(fu.no_free_unit.get(&FuOperation::IntMult), Some(&1));
    assert_eq!(fu.no_free_unit.get(&FuOperation::IntDiv), Some(&1));
    assert_eq!(fu.stalls(), 2);
    assert!(fu.acquire(FuOperation::IntAlu).is_some(), "other kinds are unaffected");

    for g in grants {
        fu.release(g.kind, g.epoch);
    }
    assert_eq!(fu.busy(FuKind::IntMultDiv), 0);
}

#[test]
fn release_all_frees_every_unit() {
    let mut fu = FuPool::new(&FuConfig::default());
    let _ = fu.acquire(FuOperation::FpSqrt);
    let _ = fu.acquire(FuOperation::ReadPort);
    assert!(!fu.is_idle());
    fu.release_all();
    assert!(fu.is_idle());
}
