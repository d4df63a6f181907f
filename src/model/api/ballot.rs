use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::ballot::{Ballot, VoterId},
};

/// A vote the user wishes to cast, naming a specific candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BallotSpec {
    pub candidate_id: ApiId,
}

/// API-friendly view of a recorded ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub voter_id: VoterId,
    pub candidate_id: ApiId,
    pub cast_at: DateTime<Utc>,
}

impl From<Ballot> for BallotReceipt {
    fn from(ballot: Ballot) -> Self {
        Self {
            candidate_id: ballot.candidate_id.into(),
            cast_at: ballot.cast_at,
            voter_id: ballot.voter_id,
        }
    }
}
