//! Demo dataset seeding: reproducible, idempotent roster, fair spread.

use std::collections::BTreeMap;
use triage_core::{
    complaint::{Complaint, Status},
    engine::TriageEngine,
    query::{ComplaintFilter, Page},
    seed::{seed_actors, seed_desk, support_identity, SeedPlan, ADMIN_IDENTITY},
};

fn everything(engine: &TriageEngine) -> Vec<Complaint> {
    engine
        .list_complaints(ADMIN_IDENTITY, &ComplaintFilter::default(), Some(Page::new(0, 1_000)))
        .unwrap()
        .items
}

fn seeded(plan: &SeedPlan) -> TriageEngine {
    let engine = TriageEngine::build_test().expect("build test engine");
    seed_desk(&engine, plan).expect("seed");
    engine
}

#[test]
fn same_seed_same_dataset() {
    let plan = SeedPlan::default();
    let a = everything(&seeded(&plan));
    let b = everything(&seeded(&plan));
    assert_eq!(a.len(), plan.complaints);
    assert_eq!(a, b);

    let other = everything(&seeded(&SeedPlan { seed: 7, ..SeedPlan::default() }));
    let filers = |rows: &[Complaint]| rows.iter().map(|c| c.created_by.clone()).collect::<Vec<_>>();
    assert_ne!(filers(&a), filers(&other), "a different seed picks different filers");
}

#[test]
fn reseeding_the_roster_adds_nothing() {
    let plan = SeedPlan::default();
    let engine = TriageEngine::build_test().unwrap();
    let first = seed_actors(&engine, &plan).unwrap();
    assert_eq!(first, 1 + plan.support + plan.employees);
    assert_eq!(seed_actors(&engine, &plan).unwrap(), 0);
    assert_eq!(engine.store().actor_count().unwrap(), first as u64);
}

#[test]
fn load_is_spread_evenly_over_support() {
    let plan = SeedPlan {
        progress_probability: 0.0,
        ..SeedPlan::default()
    };
    let engine = seeded(&plan);

    let mut load: BTreeMap<String, usize> = BTreeMap::new();
    for c in everything(&engine) {
        *load.entry(c.assigned_to.unwrap_or_default()).or_default() += 1;
    }
    assert_eq!(load.len(), plan.support);
    for i in 1..=plan.support {
        assert_eq!(load.get(&support_identity(i)), Some(&5), "{}", support_identity(i));
    }
}

#[test]
fn progressed_complaints_carry_responses() {
    let plan = SeedPlan {
        progress_probability: 1.0,
        complaints: 20,
        ..SeedPlan::default()
    };
    let engine = TriageEngine::build_test().unwrap();
    let report = seed_desk(&engine, &plan).unwrap();
    assert_eq!(report.status_changes, 20);

    for c in everything(&engine) {
        assert_ne!(c.status, Status::Pending);
        assert!(c.updated_at > c.created_at);
        match c.status {
            Status::Resolved | Status::Closed => assert!(c.response.is_some(), "{c:?}"),
            _ => assert!(c.response.is_none()),
        }
    }
}
