//! The classifier port and its adapters.
//!
//! A classifier returns raw labels. `classify` validates them: labels
//! outside the vocabulary are coerced to Other / Medium, non-finite or
//! out-of-range confidences count as a classifier failure.

use crate::{
    complaint::{Category, Urgency},
    error::{TriageError, TriageResult},
};
use serde::{Deserialize, Serialize};
use std::{
    str::FromStr,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

/// What a classifier hands back before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrediction {
    pub category: String,
    pub urgency: String,
    pub confidence_category: f64,
    pub confidence_urgency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub category: Category,
    pub urgency: Urgency,
    pub confidence_category: f64,
    pub confidence_urgency: f64,
}

impl Prediction {
    /// Labels used when classification fails during intake.
    pub fn fallback() -> Self {
        Self {
            category: Category::Other,
            urgency: Urgency::Medium,
            confidence_category: 0.0,
            confidence_urgency: 0.0,
        }
    }
}

pub trait ClassifierPort: Send + Sync {
    fn predict(&self, text: &str) -> TriageResult<RawPrediction>;
}

/// Predict and validate. Errors only when the classifier itself failed or
/// produced unusable confidences.
pub fn classify(port: &dyn ClassifierPort, text: &str) -> TriageResult<Prediction> {
    let raw = port.predict(text)?;
    coerce(raw)
}

fn coerce(raw: RawPrediction) -> TriageResult<Prediction> {
    for (name, value) in [
        ("confidenceCategory", raw.confidence_category),
        ("confidenceUrgency", raw.confidence_urgency),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(TriageError::ClassifierUnavailable(format!(
                "malformed output: {name}={value}"
            )));
        }
    }

    let category = Category::from_str(&raw.category).unwrap_or_else(|_| {
        log::warn!("classifier returned unknown category '{}', using Other", raw.category);
        Category::Other
    });
    let urgency = Urgency::from_str(&raw.urgency).unwrap_or_else(|_| {
        log::warn!("classifier returned unknown urgency '{}', using Medium", raw.urgency);
        Urgency::Medium
    });

    Ok(Prediction {
        category,
        urgency,
        confidence_category: raw.confidence_category,
        confidence_urgency: raw.confidence_urgency,
    })
}

// ── Keyword classifier ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Keyword rules. Category rules compete on hit count (ties go to the
/// earlier rule). Urgency rules are listed most severe first and the
/// first rule with any hit wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordRules {
    pub categories: Vec<KeywordRule>,
    pub urgencies: Vec<KeywordRule>,
}

/// Deterministic classifier driven by `KeywordRules`. Used when no model
/// service is wired in.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: KeywordRules,
}

impl KeywordClassifier {
    pub fn new(rules: KeywordRules) -> Self {
        Self { rules }
    }
}

fn hits(haystack: &str, rule: &KeywordRule) -> usize {
    rule.keywords
        .iter()
        .filter(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
        .count()
}

fn confidence(hits: usize) -> f64 {
    if hits == 0 {
        0.5
    } else {
        hits as f64 / (hits as f64 + 1.0)
    }
}

impl ClassifierPort for KeywordClassifier {
    fn predict(&self, text: &str) -> TriageResult<RawPrediction> {
        let haystack = text.to_lowercase();

        let mut best: Option<(&KeywordRule, usize)> = None;
        for rule in &self.rules.categories {
            let n = hits(&haystack, rule);
            if n > 0 && best.map_or(true, |(_, b)| n > b) {
                best = Some((rule, n));
            }
        }
        let (category, category_hits) = match best {
            Some((rule, n)) => (rule.label.clone(), n),
            None => (Category::Other.as_str().to_string(), 0),
        };

        let (urgency, urgency_hits) = self
            .rules
            .urgencies
            .iter()
            .map(|rule| (rule, hits(&haystack, rule)))
            .find(|(_, n)| *n > 0)
            .map(|(rule, n)| (rule.label.clone(), n))
            .unwrap_or_else(|| (Urgency::Medium.as_str().to_string(), 0));

        Ok(RawPrediction {
            category,
            urgency,
            confidence_category: confidence(category_hits),
            confidence_urgency: confidence(urgency_hits),
        })
    }
}

// ── Timeout wrapper ─────────────────────────────────────────────────

/// Runs the wrapped classifier on a worker thread and gives up after
/// `timeout`. A timed-out worker is detached, not cancelled.
pub struct TimeoutClassifier {
    inner: Arc<dyn ClassifierPort>,
    timeout: Duration,
}

impl TimeoutClassifier {
    pub fn new(inner: Arc<dyn ClassifierPort>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl ClassifierPort for TimeoutClassifier {
    fn predict(&self, text: &str) -> TriageResult<RawPrediction> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        thread::spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = tx.send(inner.predict(&text));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(TriageError::ClassifierUnavailable(
                format!("timed out after {}ms", self.timeout.as_millis()),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(TriageError::ClassifierUnavailable(
                "classifier worker exited without a result".into(),
            )),
        }
    }
}
