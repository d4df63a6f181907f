//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g. IDs
//! and datetimes as strings, and they never expose secrets.

pub mod admin;
pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod election;
pub mod id;
pub mod results;
