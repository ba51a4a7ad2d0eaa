//! Audit events.
//!
//! Every mutation appends its events to `event_log` inside the same
//! transaction as the mutation itself.

use crate::types::{ComplaintId, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    ComplaintFiled {
        complaint_id: ComplaintId,
        created_by: Identity,
        category: String,
        urgency: String,
        assigned_to: Identity,
    },
    ClassificationFallback {
        complaint_id: ComplaintId,
        reason: String,
    },
    AllocationDegraded {
        complaint_id: ComplaintId,
        placeholder: Identity,
    },
    ComplaintUpdated {
        complaint_id: ComplaintId,
        fields: Vec<String>,
    },
    ComplaintDeleted {
        complaint_id: ComplaintId,
    },
}

impl DeskEvent {
    pub fn complaint_id(&self) -> ComplaintId {
        match self {
            DeskEvent::ComplaintFiled { complaint_id, .. }
            | DeskEvent::ClassificationFallback { complaint_id, .. }
            | DeskEvent::AllocationDegraded { complaint_id, .. }
            | DeskEvent::ComplaintUpdated { complaint_id, .. }
            | DeskEvent::ComplaintDeleted { complaint_id } => *complaint_id,
        }
    }

    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeskEvent::ComplaintFiled { .. }         => "complaint_filed",
            DeskEvent::ClassificationFallback { .. } => "classification_fallback",
            DeskEvent::AllocationDegraded { .. }     => "allocation_degraded",
            DeskEvent::ComplaintUpdated { .. }       => "complaint_updated",
            DeskEvent::ComplaintDeleted { .. }       => "complaint_deleted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub event_id: String,
    pub complaint_id: ComplaintId,
    pub actor: Identity,
    pub event_type: String,
    pub payload: String,
    pub recorded_at: DateTime<Utc>,
}

impl EventLogEntry {
    pub fn new(event: &DeskEvent, actor: &str, recorded_at: DateTime<Utc>) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            event_id: uuid::Uuid::new_v4().to_string(),
            complaint_id: event.complaint_id(),
            actor: actor.to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
            recorded_at,
        })
    }

    pub fn decode(&self) -> serde_json::Result<DeskEvent> {
        serde_json::from_str(&self.payload)
    }
}
