//! Classifier adapters: keyword rules from the shipped data files and the
//! timeout wrapper.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use triage_core::{
    classifier::{classify, ClassifierPort, KeywordClassifier, RawPrediction, TimeoutClassifier},
    complaint::{Category, Urgency},
    config::DeskConfig,
    error::{TriageError, TriageResult},
};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

/// Sleeps for `delay`, then answers IT Support / High. Counts calls.
struct Delayed {
    delay: Duration,
    calls: AtomicUsize,
}

impl Delayed {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

impl ClassifierPort for Delayed {
    fn predict(&self, _text: &str) -> TriageResult<RawPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Ok(RawPrediction {
            category: "IT Support".into(),
            urgency: "High".into(),
            confidence_category: 0.8,
            confidence_urgency: 0.6,
        })
    }
}

struct Broken;

impl ClassifierPort for Broken {
    fn predict(&self, _text: &str) -> TriageResult<RawPrediction> {
        Err(TriageError::ClassifierUnavailable("connection refused".into()))
    }
}

#[test]
fn shipped_config_loads_and_validates() {
    let config = DeskConfig::load(&data_dir()).expect("load shipped config");
    assert_eq!(config.min_text_len, 10);
    assert!(config.default_page_limit <= config.max_page_limit);
    assert!(!config.classifier_rules.categories.is_empty());
    assert_eq!(config.classifier_rules.urgencies[0].label, "Critical");
}

#[test]
fn unknown_rule_labels_fail_validation() {
    let mut config = DeskConfig::default_test();
    config.classifier_rules.categories[0].label = "Parking".into();
    assert!(config.validate().is_err());

    let mut config = DeskConfig::default_test();
    config.max_page_limit = 10;
    assert!(config.validate().is_err(), "default page above the max");
}

#[test]
fn shipped_rules_classify_common_complaints() {
    let config = DeskConfig::load(&data_dir()).unwrap();
    let keyword = KeywordClassifier::new(config.classifier_rules);

    let cases = [
        ("My laptop will not connect to the VPN", Category::ItSupport, Urgency::Medium),
        ("Someone slipped near the fire exit, injury reported", Category::HealthSafety, Urgency::Critical),
        ("My payslip is missing the overtime bonus", Category::HrPayroll, Urgency::Medium),
        ("The supply cupboard has no pens or notebooks", Category::OfficeSupplies, Urgency::Medium),
        ("Nothing in particular, just saying hello", Category::Other, Urgency::Medium),
    ];
    for (text, category, urgency) in cases {
        let p = classify(&keyword, text).unwrap();
        assert_eq!((p.category, p.urgency), (category, urgency), "{text}");
    }
}

#[test]
fn fast_classifier_passes_through_the_timeout() {
    let inner = Delayed::new(Duration::from_millis(0));
    let wrapped = TimeoutClassifier::new(inner.clone(), Duration::from_secs(2));
    let p = classify(&wrapped, "The printer is jammed").unwrap();
    assert_eq!(p.category, Category::ItSupport);
    assert_eq!(p.confidence_category, 0.8);
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn slow_classifier_is_cut_off() {
    let inner = Delayed::new(Duration::from_millis(400));
    let wrapped = TimeoutClassifier::new(inner, Duration::from_millis(30));

    let started = Instant::now();
    let err = classify(&wrapped, "The printer is jammed").unwrap_err();
    assert!(matches!(err, TriageError::ClassifierUnavailable(_)));
    assert!(started.elapsed() < Duration::from_millis(400), "caller waited for the worker");
}

#[test]
fn inner_errors_propagate_through_the_timeout() {
    let wrapped = TimeoutClassifier::new(Arc::new(Broken), Duration::from_secs(1));
    let err = classify(&wrapped, "The printer is jammed").unwrap_err();
    assert_eq!(err.kind(), "classifier_unavailable");
    assert!(err.to_string().contains("connection refused"));
}
