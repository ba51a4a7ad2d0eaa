//! Actors and the directory the desk reads them from.
//!
//! Actors are provisioned out-of-band. The desk only reads them.

use crate::{
    error::{TriageError, TriageResult},
    types::{ActorId, Identity},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
    Support,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin    => "admin",
            Role::Employee => "employee",
            Role::Support  => "support",
        }
    }
}

impl FromStr for Role {
    type Err = TriageError;

    fn from_str(s: &str) -> TriageResult<Self> {
        match s {
            "admin"    => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            "support"  => Ok(Role::Support),
            other => Err(TriageError::validation(
                "role",
                format!("'{other}' is not one of [admin, employee, support]"),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub email: Identity,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

/// An actor that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewActor {
    pub email: Identity,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl NewActor {
    pub fn new(email: impl Into<Identity>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            full_name: full_name.into(),
            role,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Read access to provisioned actors.
pub trait ActorDirectory {
    /// Active actors holding `role`, ordered by ascending id.
    fn list_active_actors_by_role(&self, role: Role) -> TriageResult<Vec<Actor>>;

    fn get_actor_by_identity(&self, identity: &str) -> TriageResult<Option<Actor>>;
}
