//! Aggregate views: counts, rates, cross-tabs and monthly trends, each
//! computed over the caller's read scope.

use chrono::{DateTime, Duration};
use triage_core::{
    actor::{NewActor, Role},
    analytics,
    classifier::KeywordClassifier,
    clock::SteppingClock,
    complaint::{ComplaintUpdate, Status},
    config::DeskConfig,
    engine::TriageEngine,
    store::DeskStore,
};

/// Clock stepping 20 days per reading from 2024-01-01, so consecutive
/// complaints spread over several months.
fn build(with_support: bool) -> TriageEngine {
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = DeskConfig::default_test();
    let start = DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    let engine = TriageEngine::new(
        store,
        Box::new(KeywordClassifier::new(config.classifier_rules.clone())),
        Box::new(SteppingClock::new(start, Duration::days(20))),
        config,
    );
    let store = engine.store();
    store.insert_actor(&NewActor::new("admin@x", "Admin", Role::Admin)).unwrap();
    store.insert_actor(&NewActor::new("emp1@x", "Employee 1", Role::Employee)).unwrap();
    store.insert_actor(&NewActor::new("emp2@x", "Employee 2", Role::Employee)).unwrap();
    if with_support {
        store.insert_actor(&NewActor::new("sup@x", "Support", Role::Support)).unwrap();
    }
    engine
}

fn file_four(engine: &TriageEngine) {
    engine.create_complaint("The printer is broken on floor two", "emp1@x").unwrap(); // 2024-01-01
    engine.create_complaint("Heating is off in the east wing", "emp1@x").unwrap(); // 2024-01-21
    engine.create_complaint("My laptop battery died this morning", "emp2@x").unwrap(); // 2024-02-10
    engine.create_complaint("Payslip shows the wrong overtime", "emp2@x").unwrap(); // 2024-03-01
}

#[test]
fn empty_scope_yields_zeros() {
    let stats = analytics::basic_stats(&[], "unassigned@university.edu");
    assert_eq!(stats.total_complaints, 0);
    assert_eq!(stats.response_rate, 0.0);
    assert_eq!(stats.assigned_rate, 0.0);
    assert!(stats.by_category.is_empty());

    let rel = analytics::category_relationships(&[]);
    assert!(rel.category_urgency.rows.is_empty());
    assert!(rel.category_urgency.data.is_empty());
    let trends = analytics::time_trends(&[]);
    assert!(trends.monthly_by_category.is_empty());
    assert!(trends.daily_counts.dates.is_empty());
}

#[test]
fn stats_follow_the_read_scope() {
    let engine = build(true);
    file_four(&engine);

    let all = engine.basic_stats("admin@x").unwrap();
    assert_eq!(all.total_complaints, 4);
    assert_eq!(all.by_category.get("IT Support"), Some(&2));
    assert_eq!(all.by_status.get("Pending"), Some(&4));

    let mine = engine.basic_stats("emp2@x").unwrap();
    assert_eq!(mine.total_complaints, 2);
    assert_eq!(mine.by_category.get("HR / Payroll"), Some(&1));

    let support = engine.basic_stats("sup@x").unwrap();
    assert_eq!(support.total_complaints, 4, "sole support actor holds everything");
}

#[test]
fn rates_count_responses_and_real_assignees() {
    let engine = build(false);
    file_four(&engine);
    engine.store().insert_actor(&NewActor::new("sup@x", "Support", Role::Support)).unwrap();
    engine.create_complaint("The wifi drops every few minutes", "emp1@x").unwrap();

    let pending = engine
        .list_complaints("admin@x", &Default::default(), None)
        .unwrap()
        .items;
    let oldest = pending.last().unwrap();
    engine
        .update_complaint(
            oldest.id,
            "admin@x",
            &ComplaintUpdate::default().status(Status::Resolved).response("Replaced the fuser"),
        )
        .unwrap();

    let stats = engine.basic_stats("admin@x").unwrap();
    assert_eq!(stats.total_complaints, 5);
    assert!((stats.response_rate - 20.0).abs() < 1e-9);
    assert!((stats.assigned_rate - 20.0).abs() < 1e-9, "placeholder assignments excluded");
    assert_eq!(stats.by_status.get("Resolved"), Some(&1));
}

#[test]
fn cross_tabs_cover_every_observed_pair() {
    let engine = build(true);
    file_four(&engine);
    let rel = engine.category_relationships("admin@x").unwrap();

    let tab = &rel.category_urgency;
    assert_eq!(tab.rows, vec!["Facilities", "HR / Payroll", "IT Support"]);
    assert_eq!(tab.data.len(), tab.rows.len());
    assert!(tab.data.iter().all(|row| row.len() == tab.columns.len()));
    let total: u64 = tab.data.iter().flatten().sum();
    assert_eq!(total, 4);

    let it = tab.rows.iter().position(|r| r == "IT Support").unwrap();
    let high = tab.columns.iter().position(|c| c == "High").unwrap();
    assert_eq!(tab.data[it][high], 1);

    assert_eq!(rel.category_status.columns, vec!["Pending"]);
}

#[test]
fn trends_bucket_by_month() {
    let engine = build(true);
    file_four(&engine);
    let trends = engine.time_trends("admin@x").unwrap();

    let months: Vec<&str> = trends.monthly_by_category.iter().map(|b| b.month.as_str()).collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

    let january = &trends.monthly_by_category[0].counts;
    assert_eq!(january.get("IT Support"), Some(&1));
    assert_eq!(january.get("Facilities"), Some(&1));
    assert_eq!(january.get("HR / Payroll"), Some(&0), "zero-filled");
    for bucket in &trends.monthly_by_category {
        assert_eq!(bucket.counts.len(), trends.categories.len());
    }

    let daily = &trends.daily_counts;
    assert_eq!(daily.dates, vec!["2024-01-01", "2024-01-21", "2024-02-10", "2024-03-01"]);
    assert_eq!(daily.counts, vec![1, 1, 1, 1]);

    let scoped = engine.time_trends("emp1@x").unwrap();
    assert_eq!(scoped.monthly_by_category.len(), 1);
    assert_eq!(scoped.daily_counts.dates, vec!["2024-01-01", "2024-01-21"]);
}

#[test]
fn word_frequency_ranks_scoped_words() {
    let engine = build(true);
    engine.create_complaint("Printer broken, printer jammed!", "emp1@x").unwrap();
    engine.create_complaint("The printer is broken again", "emp1@x").unwrap();
    engine.create_complaint("Wifi is down again", "emp2@x").unwrap();

    let top = engine.word_frequency("admin@x", 3).unwrap();
    let pairs: Vec<(&str, u64)> = top.iter().map(|w| (w.word.as_str(), w.count)).collect();
    assert_eq!(pairs, vec![("printer", 3), ("again", 2), ("broken", 2)]);

    let mine = engine.word_frequency("emp2@x", 30).unwrap();
    let words: Vec<&str> = mine.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(words, vec!["again", "down", "wifi"], "stopwords and short words dropped");

    assert!(engine.word_frequency("admin@x", 0).unwrap().is_empty());
    assert!(analytics::word_frequency(&[], 10).is_empty());
}
