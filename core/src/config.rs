use crate::{
    allocator::AllocationMode,
    classifier::{KeywordRule, KeywordRules},
    complaint::{Category, Urgency},
};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    pub min_text_len: usize,
    pub classifier_timeout_ms: u64,
    /// Placeholder identity used when no support actor is active.
    pub unassigned_identity: String,
    pub default_page_limit: u64,
    pub max_page_limit: u64,
    #[serde(default)]
    pub allocation_mode: AllocationMode,
    #[serde(skip)]
    pub classifier_rules: KeywordRules,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let mut config: DeskConfig = serde_json::from_str(&content)?;

        let rules_path = format!("{data_dir}/classifier/keyword_rules.json");
        let rules_content = std::fs::read_to_string(&rules_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rules_path}: {e}"))?;
        config.classifier_rules = serde_json::from_str(&rules_content)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_text_len == 0 {
            anyhow::bail!("min_text_len must be at least 1");
        }
        if self.default_page_limit > self.max_page_limit {
            anyhow::bail!(
                "default_page_limit ({}) exceeds max_page_limit ({})",
                self.default_page_limit,
                self.max_page_limit
            );
        }
        if self.unassigned_identity.trim().is_empty() {
            anyhow::bail!("unassigned_identity must not be empty");
        }
        for rule in &self.classifier_rules.categories {
            Category::from_str(&rule.label)
                .map_err(|_| anyhow::anyhow!("keyword rule has unknown category '{}'", rule.label))?;
        }
        for rule in &self.classifier_rules.urgencies {
            Urgency::from_str(&rule.label)
                .map_err(|_| anyhow::anyhow!("keyword rule has unknown urgency '{}'", rule.label))?;
        }
        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn with_allocation_mode(mut self, mode: AllocationMode) -> Self {
        self.allocation_mode = mode;
        self
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let rule = |label: &str, keywords: &[&str]| KeywordRule {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            min_text_len: 10,
            classifier_timeout_ms: 2_000,
            unassigned_identity: "unassigned@university.edu".into(),
            default_page_limit: 100,
            max_page_limit: 1_000,
            allocation_mode: AllocationMode::LiveCount,
            classifier_rules: KeywordRules {
                categories: vec![
                    rule("IT Support", &["printer", "laptop", "wifi", "password", "email"]),
                    rule("Facilities", &["heating", "toilet", "lift", "elevator", "leak"]),
                    rule("HR / Payroll", &["salary", "payslip", "overtime", "payroll"]),
                    rule("Health & Safety", &["hazard", "injury", "fire exit", "slippery"]),
                    rule("Finance", &["invoice", "reimbursement", "expense"]),
                    rule("Security", &["badge", "theft", "intruder"]),
                ],
                urgencies: vec![
                    rule("Critical", &["fire", "injury", "emergency", "outage"]),
                    rule("High", &["urgent", "broken", "asap"]),
                    rule("Low", &["suggestion", "whenever", "minor"]),
                ],
            },
        }
    }
}
