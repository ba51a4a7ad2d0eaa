//! Round-robin assignment of new complaints to support actors.
//!
//! `allocate` is a pure function of (roster, counter). Where the counter
//! comes from is decided by `AllocationMode`:
//!   - LiveCount: the number of stored complaints before the insert. Two
//!     concurrent creations can observe the same count, so rotation is
//!     approximate under concurrent writers.
//!   - Sequence: a dedicated counter advanced inside an immediate
//!     transaction. Exact rotation, at the cost of serializing creation.

use crate::{actor::Actor, types::Identity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    #[default]
    LiveCount,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    Assigned(Identity),
    /// No active support actor existed; carries the placeholder identity.
    Unassigned(Identity),
}

impl Allocation {
    pub fn identity(&self) -> &str {
        match self {
            Allocation::Assigned(identity) | Allocation::Unassigned(identity) => identity,
        }
    }

    pub fn into_identity(self) -> Identity {
        match self {
            Allocation::Assigned(identity) | Allocation::Unassigned(identity) => identity,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Allocation::Unassigned(_))
    }
}

/// Pick `roster[counter mod len]` with the roster ordered by ascending id.
/// An empty roster yields `Unassigned(sentinel)`.
pub fn allocate(roster: &[Actor], counter: u64, sentinel: &str) -> Allocation {
    if roster.is_empty() {
        return Allocation::Unassigned(sentinel.to_string());
    }
    let mut ordered: Vec<&Actor> = roster.iter().collect();
    ordered.sort_by_key(|a| a.id);
    let index = (counter % ordered.len() as u64) as usize;
    Allocation::Assigned(ordered[index].email.clone())
}
