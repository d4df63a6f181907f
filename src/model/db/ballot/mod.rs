mod cast;
pub use cast::{cast_ballot, MAX_CAST_ATTEMPTS};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::error::Error as DbError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::mongodb::Id;

/// Opaque voter identifier, as issued by the identity provider.
pub type VoterId = String;

/// Core ballot data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCore {
    /// Soft reference to the chosen candidate.
    pub candidate_id: Id,
    /// When the ballot was accepted.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A ballot: the immutable record that one voter has voted for one candidate.
///
/// The storage key is the voter ID itself, which is what enforces
/// at-most-one-ballot-per-voter. Ballots are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub voter_id: VoterId,
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Ballot {
    /// Create a ballot for the given voter and candidate, stamped now.
    pub fn new(voter_id: VoterId, candidate_id: Id) -> Self {
        Self {
            voter_id,
            ballot: BallotCore {
                candidate_id,
                cast_at: Utc::now(),
            },
        }
    }
}

impl std::ops::Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}

/// Why a ballot was not recorded.
///
/// Every rejected cast is distinguishable from success and from every other
/// failure kind; the caller decides the user-visible messaging.
#[derive(Debug, Error)]
pub enum CastError {
    /// Balloting is not open. Terminal.
    #[error("balloting is not currently open")]
    BallotingClosed,
    /// The voter already has a recorded ballot. Terminal; retrying cannot
    /// change the outcome.
    #[error("voter has already cast a ballot")]
    AlreadyVoted,
    /// The chosen candidate does not exist; the caller's candidate list is
    /// stale. Terminal.
    #[error("no candidate with ID {0}")]
    CandidateNotFound(Id),
    /// Retries were exhausted under write contention. The caller may safely
    /// re-invoke with the same arguments.
    #[error("ballot could not be recorded under write contention: {0}")]
    TransientConflict(#[source] DbError),
    /// Any other database failure.
    #[error(transparent)]
    Db(DbError),
}
