use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::candidate::{Candidate, CandidateMetadata, NewCandidate},
};

/// Admin-supplied candidate metadata. Deliberately has no tally field: a
/// metadata edit can never change the vote count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateSpec {
    pub name: String,
    pub vision: String,
    pub mission: String,
    pub photo: Option<String>,
    pub order: u32,
}

impl From<CandidateSpec> for CandidateMetadata {
    fn from(spec: CandidateSpec) -> Self {
        Self {
            name: spec.name,
            vision: spec.vision,
            mission: spec.mission,
            photo: spec.photo,
            order: spec.order,
        }
    }
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        NewCandidate::new(spec.into())
    }
}

/// API-friendly view of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    pub name: String,
    pub vision: String,
    pub mission: String,
    pub photo: Option<String>,
    pub order: u32,
    pub vote_tally: i64,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.into(),
            vote_tally: candidate.candidate.vote_tally,
            order: candidate.candidate.metadata.order,
            photo: candidate.candidate.metadata.photo,
            mission: candidate.candidate.metadata.mission,
            vision: candidate.candidate.metadata.vision,
            name: candidate.candidate.metadata.name,
        }
    }
}
