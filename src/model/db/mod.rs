//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod admin;
pub mod ballot;
pub mod candidate;
pub mod election;

pub use admin::{ensure_admin_exists, Admin, AdminCore, NewAdmin};
pub use ballot::{cast_ballot, Ballot, BallotCore, CastError, VoterId};
pub use candidate::{Candidate, CandidateMetadata, NewCandidate};
pub use election::{ensure_election_control_exists, ElectionControl, ELECTION_CONTROL_ID};
