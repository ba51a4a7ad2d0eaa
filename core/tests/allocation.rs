//! Round-robin allocation tests.
//!
//! The allocator is a pure function of (roster, counter); the engine feeds
//! it either the live complaint count or the serialized sequence.

use triage_core::{
    actor::{Actor, NewActor, Role},
    allocator::{allocate, Allocation, AllocationMode},
    config::DeskConfig,
    engine::TriageEngine,
    event::DeskEvent,
};

const SENTINEL: &str = "unassigned@university.edu";

fn support(id: i64, email: &str) -> Actor {
    Actor {
        id,
        email: email.into(),
        full_name: email.into(),
        role: Role::Support,
        is_active: true,
    }
}

fn build(mode: AllocationMode, support_count: usize) -> TriageEngine {
    let engine = TriageEngine::build_test_with(DeskConfig::default_test().with_allocation_mode(mode))
        .expect("build test engine");
    for i in 1..=support_count {
        engine
            .store()
            .insert_actor(&NewActor::new(format!("s{i}@desk.test"), format!("Support {i}"), Role::Support))
            .unwrap();
    }
    engine
        .store()
        .insert_actor(&NewActor::new("filer@desk.test", "Filer", Role::Employee))
        .unwrap();
    engine
}

fn file(engine: &TriageEngine) -> String {
    engine
        .create_complaint("The printer keeps jamming on every page", "filer@desk.test")
        .unwrap()
        .assigned_to
        .unwrap()
}

/// Roster [A, B, C] with counters 0..=4 yields A, B, C, A, B, regardless
/// of the order the roster was handed over in.
#[test]
fn rotation_follows_id_order() {
    let roster = vec![support(30, "c@x"), support(10, "a@x"), support(20, "b@x")];
    let picked: Vec<String> = (0..5)
        .map(|n| allocate(&roster, n, SENTINEL).into_identity())
        .collect();
    assert_eq!(picked, vec!["a@x", "b@x", "c@x", "a@x", "b@x"]);
}

#[test]
fn empty_roster_returns_placeholder() {
    let allocation = allocate(&[], 7, SENTINEL);
    assert_eq!(allocation, Allocation::Unassigned(SENTINEL.to_string()));
    assert!(allocation.is_degraded());
    assert_eq!(allocation.identity(), SENTINEL);
}

#[test]
fn allocation_is_reproducible() {
    let roster = vec![support(1, "a@x"), support(2, "b@x")];
    for n in 0..10 {
        assert_eq!(allocate(&roster, n, SENTINEL), allocate(&roster, n, SENTINEL));
    }
}

#[test]
fn creation_rotates_through_active_support() {
    let engine = build(AllocationMode::LiveCount, 3);
    let assigned: Vec<String> = (0..5).map(|_| file(&engine)).collect();
    assert_eq!(
        assigned,
        vec!["s1@desk.test", "s2@desk.test", "s3@desk.test", "s1@desk.test", "s2@desk.test"]
    );
}

#[test]
fn inactive_support_is_skipped() {
    let engine = build(AllocationMode::LiveCount, 3);
    engine.store().set_actor_active("s2@desk.test", false).unwrap();

    let assigned: Vec<String> = (0..4).map(|_| file(&engine)).collect();
    assert_eq!(
        assigned,
        vec!["s1@desk.test", "s3@desk.test", "s1@desk.test", "s3@desk.test"]
    );
}

/// No active support actors: creation still succeeds, the placeholder is
/// assigned, and the degradation is recorded in the audit log.
#[test]
fn no_support_assigns_placeholder() {
    let engine = build(AllocationMode::LiveCount, 0);
    let complaint = engine
        .create_complaint("The printer keeps jamming on every page", "filer@desk.test")
        .unwrap();
    assert_eq!(complaint.assigned_to.as_deref(), Some(SENTINEL));

    let events = engine.store().events_for_complaint(complaint.id).unwrap();
    let degraded = events
        .iter()
        .filter_map(|e| e.decode().ok())
        .any(|e| matches!(e, DeskEvent::AllocationDegraded { .. }));
    assert!(degraded, "Expected an allocation_degraded event");
}

/// The live count shrinks after a delete, so the same support actor can be
/// picked twice in a row. The sequence counter never goes backwards.
#[test]
fn live_count_repeats_after_delete_but_sequence_does_not() {
    let live = build(AllocationMode::LiveCount, 3);
    let first = live
        .create_complaint("The printer keeps jamming on every page", "filer@desk.test")
        .unwrap();
    file(&live); // s2
    file(&live); // s3
    live.delete(first.id, "filer@desk.test").unwrap();
    // Two complaints remain: counter 2 → s3 again.
    assert_eq!(file(&live), "s3@desk.test");

    let seq = build(AllocationMode::Sequence, 3);
    let first = seq
        .create_complaint("The printer keeps jamming on every page", "filer@desk.test")
        .unwrap();
    file(&seq);
    file(&seq);
    seq.delete(first.id, "filer@desk.test").unwrap();
    assert_eq!(file(&seq), "s1@desk.test");
}
