use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Candidate metadata, editable by administrators as a single unit.
///
/// The vote tally deliberately lives outside this struct: administrative
/// edits serialise `CandidateMetadata` alone into the update, so they cannot
/// touch the tally field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// Display name.
    pub name: String,
    /// Free-text vision statement.
    pub vision: String,
    /// Free-text mission statement.
    pub mission: String,
    /// Reference to the candidate's photo, if uploaded.
    pub photo: Option<String>,
    /// Display order; also breaks ranking ties.
    pub order: u32,
}

/// A candidate without an ID, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    #[serde(flatten)]
    pub metadata: CandidateMetadata,
    /// Running count of accepted ballots. Non-negative; only ever mutated by
    /// the ballot casting protocol, by exactly one per accepted ballot.
    pub vote_tally: i64,
}

impl NewCandidate {
    /// A new candidate starts with an empty tally.
    pub fn new(metadata: CandidateMetadata) -> Self {
        Self {
            metadata,
            vote_tally: 0,
        }
    }
}

impl Deref for NewCandidate {
    type Target = CandidateMetadata;

    fn deref(&self) -> &Self::Target {
        &self.metadata
    }
}

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: NewCandidate,
}

impl Deref for Candidate {
    type Target = NewCandidate;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateMetadata {
        pub fn example1() -> Self {
            Self {
                name: "Aisyah Putri".to_string(),
                vision: "A transparent and inclusive student council.".to_string(),
                mission: "Open budget reports; monthly class forums.".to_string(),
                photo: Some("photos/aisyah.jpg".to_string()),
                order: 1,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Bagus Wirawan".to_string(),
                vision: "A school community that celebrates every talent.".to_string(),
                mission: "Revive the arts week; expand club funding.".to_string(),
                photo: None,
                order: 2,
            }
        }
    }

    impl Candidate {
        pub fn example1() -> Self {
            Self {
                id: Id::new(),
                candidate: NewCandidate::new(CandidateMetadata::example1()),
            }
        }

        pub fn example2() -> Self {
            Self {
                id: Id::new(),
                candidate: NewCandidate::new(CandidateMetadata::example2()),
            }
        }
    }
}
