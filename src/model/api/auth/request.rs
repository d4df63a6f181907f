use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed identity assertion from the school's identity provider, exchanged
/// for a voter session cookie.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoterAssertion {
    pub assertion: String,
}

/// The claims inside an identity-provider assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdpClaims {
    /// The stable voter identifier.
    pub sub: String,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

#[cfg(test)]
pub const EXAMPLE_VOTER_ID: &str = "osis-2026-0042";
