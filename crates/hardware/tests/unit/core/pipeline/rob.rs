//! Reorder Buffer and LSQ Queue Tests.

use cmpsim_core::core::pipeline::rob::{EntryQueue, EntryStatus, LsqEntry, RobKind};

fn store(ea: u32) -> LsqEntry {
    LsqEntry {
        inst_id: 0,
        pc: 0x1000,
        ea,
        is_store: true,
        store_address_ready: false,
        address_ready_cycle: None,
        sources: Vec::new(),
        targets: Vec::new(),
        not_ready_operands: 1,
        status: EntryStatus::default(),
        in_flight: false,
    }
}

#[test]
fn iteration_follows_program_order_after_removals() {
    let mut q: EntryQueue<u32> = EntryQueue::new(8);
    let handles: Vec<_> = (1..=5).map(|i| q.push(i, i as u32).unwrap()).collect();
    let _ = q.remove(handles[2]);
    let order: Vec<u32> = q.iter().map(|(_, v)| *v).collect();
    assert_eq!(order, vec![1, 2, 4, 5]);
    assert_eq!(q.handles().next_back(), Some(handles[4]));
}

#[test]
fn full_queue_frees_a_slot_on_commit() {
    let mut q: EntryQueue<&str> = EntryQueue::new(2);
    let _ = q.push(1, "a");
    let _ = q.push(2, "b");
    assert!(q.push(3, "c").is_none());
    assert_eq!(q.pop_head().map(|(_, v)| v), Some("a"));
    assert!(q.push(3, "c").is_some());
    assert_eq!(q.capacity(), 2);
}

#[test]
fn squash_walk_pops_youngest_first() {
    let mut q: EntryQueue<u64> = EntryQueue::new(4);
    for id in 10..14 {
        let _ = q.push(id, id);
    }
    let mut popped = Vec::new();
    while let Some((_, v)) = q.pop_tail() {
        popped.push(v);
    }
    assert_eq!(popped, vec![13, 12, 11, 10]);
}

#[test]
fn store_address_resolves_the_cycle_after_its_base() {
    let mut e = store(0x100);
    assert!(!e.address_resolved_at(100));
    e.set_store_address_ready(5);
    assert!(!e.address_resolved_at(5));
    assert!(e.address_resolved_at(6));
    assert!(!e.all_operands_ready(), "data operand still outstanding");
}

#[test]
fn only_loads_and_stores_are_memory_kinds() {
    assert!(RobKind::Load.is_memory());
    assert!(RobKind::Store.is_memory());
    assert!(!RobKind::Plain.is_memory());
    assert_eq!(RobKind::default(), RobKind::Plain);
}
