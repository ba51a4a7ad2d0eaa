//! Complaint intake and triage: lifecycle, round-robin allocation,
//! role-scoped access control and filtered queries over a SQLite store.

pub mod access;
pub mod actor;
pub mod allocator;
pub mod analytics;
pub mod classifier;
pub mod clock;
pub mod complaint;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod query;
pub mod rng;
pub mod seed;
pub mod store;
pub mod types;
