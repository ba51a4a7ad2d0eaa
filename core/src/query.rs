//! List filters, pagination and the list result shape.
//!
//! The store renders `ReadScope` + `ComplaintFilter` into one WHERE clause
//! shared by the page query and the count query. `ComplaintFilter::matches`
//! is the in-memory twin of that clause.

use crate::{
    complaint::{Category, Complaint, Status, Urgency},
    error::{TriageError, TriageResult},
    types::Identity,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplaintFilter {
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub status: Option<Status>,
    pub assigned_to: Option<Identity>,
    /// Case-insensitive substring of `text`.
    pub search_text: Option<String>,
}

impl ComplaintFilter {
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn assigned_to(mut self, identity: impl Into<Identity>) -> Self {
        self.assigned_to = Some(identity.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Empty strings mean "no filter", like an omitted query parameter.
    pub fn normalized(mut self) -> Self {
        if self.assigned_to.as_deref().is_some_and(str::is_empty) {
            self.assigned_to = None;
        }
        if self.search_text.as_deref().is_some_and(str::is_empty) {
            self.search_text = None;
        }
        self
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        if self.category.is_some_and(|c| c != complaint.category) {
            return false;
        }
        if self.urgency.is_some_and(|u| u != complaint.urgency) {
            return false;
        }
        if self.status.is_some_and(|s| s != complaint.status) {
            return false;
        }
        if let Some(assignee) = &self.assigned_to {
            if complaint.assigned_to.as_ref() != Some(assignee) {
                return false;
            }
        }
        if let Some(needle) = &self.search_text {
            // Same folding as the store's fold_case().
            let hay = complaint.text.to_lowercase();
            if !hay.contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    pub fn validate(&self, max_limit: u64) -> TriageResult<()> {
        if self.limit > max_limit {
            return Err(TriageError::validation(
                "limit",
                format!("{} exceeds the maximum page size of {max_limit}", self.limit),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub items: Vec<Complaint>,
    /// Size of the full scoped and filtered set, not of this page.
    pub total: u64,
}
