//! Role-scoped access control.
//!
//! `can_access` is the single decision function for one complaint.
//! `ReadScope` is the same read rule in a form the store can turn into a
//! WHERE clause, so list queries scope in SQL instead of post-filtering.

use crate::{
    actor::{Actor, Role},
    complaint::Complaint,
    types::Identity,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read   => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    InactiveActor,
    /// Employee reading a complaint someone else filed.
    NotCreator,
    /// Employees never mutate complaints, even their own.
    EmployeeReadOnly,
    /// Support reading a complaint neither assigned to nor filed by them.
    NotAssigneeOrCreator,
    /// Support mutating a complaint not assigned to them.
    NotAssignee,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DenyReason::InactiveActor        => "actor is inactive",
            DenyReason::NotCreator           => "complaint was filed by another actor",
            DenyReason::EmployeeReadOnly     => "employees may not modify complaints",
            DenyReason::NotAssigneeOrCreator => "complaint is neither assigned to nor filed by this actor",
            DenyReason::NotAssignee          => "complaint is not assigned to this actor",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

pub fn can_access(actor: &Actor, complaint: &Complaint, op: Operation) -> AccessDecision {
    if !actor.is_active {
        return AccessDecision::Deny(DenyReason::InactiveActor);
    }
    let is_creator = complaint.created_by == actor.email;
    let is_assignee = complaint.assigned_to.as_deref() == Some(actor.email.as_str());

    match (actor.role, op) {
        (Role::Admin, _) => AccessDecision::Allow,

        (Role::Employee, Operation::Read) if is_creator => AccessDecision::Allow,
        (Role::Employee, Operation::Read) => AccessDecision::Deny(DenyReason::NotCreator),
        (Role::Employee, Operation::Update | Operation::Delete) => {
            AccessDecision::Deny(DenyReason::EmployeeReadOnly)
        }

        (Role::Support, Operation::Read) if is_assignee || is_creator => AccessDecision::Allow,
        (Role::Support, Operation::Read) => AccessDecision::Deny(DenyReason::NotAssigneeOrCreator),
        (Role::Support, Operation::Update | Operation::Delete) if is_assignee => {
            AccessDecision::Allow
        }
        (Role::Support, Operation::Update | Operation::Delete) => {
            AccessDecision::Deny(DenyReason::NotAssignee)
        }
    }
}

/// The read rule as a storage-level condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    All,
    CreatedBy(Identity),
    AssignedToOrCreatedBy(Identity),
}

impl ReadScope {
    /// Callers must reject inactive actors first.
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin    => ReadScope::All,
            Role::Employee => ReadScope::CreatedBy(actor.email.clone()),
            Role::Support  => ReadScope::AssignedToOrCreatedBy(actor.email.clone()),
        }
    }

    /// In-memory evaluation of the condition the store renders into SQL.
    pub fn admits(&self, complaint: &Complaint) -> bool {
        match self {
            ReadScope::All => true,
            ReadScope::CreatedBy(email) => &complaint.created_by == email,
            ReadScope::AssignedToOrCreatedBy(email) => {
                complaint.assigned_to.as_ref() == Some(email) || &complaint.created_by == email
            }
        }
    }
}
