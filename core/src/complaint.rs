//! The complaint entity and its closed vocabularies.
//!
//! Category, urgency and status are closed enums at this layer even though
//! the store keeps them as strings. Every write goes through these types.

use crate::{
    error::{TriageError, TriageResult},
    types::{ComplaintId, Identity},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Employee Experience")]
    EmployeeExperience,
    #[serde(rename = "Facilities")]
    Facilities,
    #[serde(rename = "Finance")]
    Finance,
    #[serde(rename = "HR / Payroll")]
    HrPayroll,
    #[serde(rename = "HR / Workplace Culture")]
    HrWorkplaceCulture,
    #[serde(rename = "Health & Safety")]
    HealthSafety,
    #[serde(rename = "IT Support")]
    ItSupport,
    #[serde(rename = "Management")]
    Management,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    #[serde(rename = "Security")]
    Security,
    #[serde(rename = "Workplace Culture")]
    WorkplaceCulture,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::EmployeeExperience,
        Category::Facilities,
        Category::Finance,
        Category::HrPayroll,
        Category::HrWorkplaceCulture,
        Category::HealthSafety,
        Category::ItSupport,
        Category::Management,
        Category::OfficeSupplies,
        Category::Security,
        Category::WorkplaceCulture,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EmployeeExperience => "Employee Experience",
            Category::Facilities         => "Facilities",
            Category::Finance            => "Finance",
            Category::HrPayroll          => "HR / Payroll",
            Category::HrWorkplaceCulture => "HR / Workplace Culture",
            Category::HealthSafety       => "Health & Safety",
            Category::ItSupport          => "IT Support",
            Category::Management         => "Management",
            Category::OfficeSupplies     => "Office Supplies",
            Category::Security           => "Security",
            Category::WorkplaceCulture   => "Workplace Culture",
            Category::Other              => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low      => "Low",
            Urgency::Medium   => "Medium",
            Urgency::High     => "High",
            Urgency::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Pending, Status::InProgress, Status::Resolved, Status::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending    => "Pending",
            Status::InProgress => "In Progress",
            Status::Resolved   => "Resolved",
            Status::Closed     => "Closed",
        }
    }
}

macro_rules! closed_vocabulary {
    ($ty:ident, $field:literal) => {
        impl FromStr for $ty {
            type Err = TriageError;

            fn from_str(s: &str) -> TriageResult<Self> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        TriageError::validation(
                            $field,
                            format!("'{s}' is not one of [{}]", allowed.join(", ")),
                        )
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_vocabulary!(Category, "category");
closed_vocabulary!(Urgency, "urgency");
closed_vocabulary!(Status, "status");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: ComplaintId,
    pub text: String,
    pub created_by: Identity,
    pub category: Category,
    pub urgency: Urgency,
    pub status: Status,
    pub assigned_to: Option<Identity>,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully classified and allocated complaint, ready to insert.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub text: String,
    pub created_by: Identity,
    pub category: Category,
    pub urgency: Urgency,
    pub assigned_to: Identity,
    pub created_at: DateTime<Utc>,
}

/// Fields a caller may not set through an update.
pub const IMMUTABLE_FIELDS: [&str; 4] = ["id", "createdBy", "createdAt", "updatedAt"];

/// Partial update. Absent fields are left untouched.
///
/// This is the writable-field allow-list: anything not named here is
/// rejected when decoding from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComplaintUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ComplaintUpdate {
    /// Decode a caller-supplied JSON object, rejecting immutable and
    /// unknown fields as validation errors.
    pub fn from_json(value: serde_json::Value) -> TriageResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(TriageError::validation("update", "expected a JSON object"));
        };
        if let Some(field) = IMMUTABLE_FIELDS.iter().find(|f| object.contains_key(**f)) {
            return Err(TriageError::validation(*field, "field is not writable"));
        }
        serde_json::from_value(value).map_err(|e| TriageError::validation("update", e.to_string()))
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn assigned_to(mut self, identity: impl Into<Identity>) -> Self {
        self.assigned_to = Some(identity.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Wire names of the fields this update touches, in a fixed order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.text.is_some()        { fields.push("text"); }
        if self.category.is_some()    { fields.push("category"); }
        if self.urgency.is_some()     { fields.push("urgency"); }
        if self.status.is_some()      { fields.push("status"); }
        if self.assigned_to.is_some() { fields.push("assignedTo"); }
        if self.response.is_some()    { fields.push("response"); }
        fields
    }

    /// Apply onto a stored complaint. Does not touch timestamps.
    pub fn apply_to(&self, complaint: &mut Complaint) {
        if let Some(text) = &self.text {
            complaint.text = text.clone();
        }
        if let Some(category) = self.category {
            complaint.category = category;
        }
        if let Some(urgency) = self.urgency {
            complaint.urgency = urgency;
        }
        if let Some(status) = self.status {
            complaint.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            complaint.assigned_to = Some(assigned_to.clone());
        }
        if let Some(response) = &self.response {
            complaint.response = Some(response.clone());
        }
    }
}
