use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{candidate::Candidate, election::ElectionControl},
};

/// One candidate's standing in the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: ApiId,
    pub name: String,
    pub order: u32,
    pub vote_tally: i64,
    pub percentage: f64,
}

/// Derived tally presentation over the whole candidate registry. Read-only;
/// computing it never mutates anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub title: String,
    pub is_open: bool,
    pub total_votes: i64,
    pub rankings: Vec<CandidateResult>,
}

impl ElectionResults {
    /// Rank candidates by tally, descending. Ties break on display order so
    /// the ranking is deterministic.
    pub fn compute(control: &ElectionControl, candidates: Vec<Candidate>) -> Self {
        let total_votes: i64 = candidates.iter().map(|c| c.vote_tally).sum();

        let mut rankings = candidates
            .into_iter()
            .map(|candidate| {
                let percentage = if total_votes > 0 {
                    candidate.vote_tally as f64 * 100.0 / total_votes as f64
                } else {
                    0.0
                };
                CandidateResult {
                    id: candidate.id.into(),
                    vote_tally: candidate.candidate.vote_tally,
                    order: candidate.candidate.metadata.order,
                    name: candidate.candidate.metadata.name,
                    percentage,
                }
            })
            .collect::<Vec<_>>();
        rankings.sort_by(|a, b| {
            b.vote_tally
                .cmp(&a.vote_tally)
                .then(a.order.cmp(&b.order))
        });

        Self {
            title: control.title.clone(),
            is_open: control.is_open,
            total_votes,
            rankings,
        }
    }
}
