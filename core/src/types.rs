//! Shared primitive types used across the desk.

/// Server-assigned complaint identifier.
pub type ComplaintId = i64;

/// Server-assigned actor identifier. Orders the support roster.
pub type ActorId = i64;

/// An actor's identity on the wire: their email address.
pub type Identity = String;
