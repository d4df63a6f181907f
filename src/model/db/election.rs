use chrono::{DateTime, Utc};
use mongodb::{bson::doc, error::Error as DbError};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::{
    is_duplicate_key_error, option_chrono_datetime_as_bson_datetime, Coll,
};

/// Fixed key of the election control singleton.
pub const ELECTION_CONTROL_ID: &str = "control";

/// The election control state: a singleton document recording whether
/// balloting is currently open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionControl {
    #[serde(rename = "_id")]
    pub id: String,
    /// Display title of the running election.
    pub title: String,
    /// Whether new ballots are currently accepted.
    pub is_open: bool,
    /// When balloting was last opened.
    #[serde(with = "option_chrono_datetime_as_bson_datetime")]
    pub opened_at: Option<DateTime<Utc>>,
    /// When balloting was last closed.
    #[serde(with = "option_chrono_datetime_as_bson_datetime")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl ElectionControl {
    /// A filter document selecting the singleton.
    pub fn filter() -> mongodb::bson::Document {
        doc! { "_id": ELECTION_CONTROL_ID }
    }
}

impl Default for ElectionControl {
    fn default() -> Self {
        Self {
            id: ELECTION_CONTROL_ID.to_string(),
            title: "OSIS Election".to_string(),
            is_open: false,
            opened_at: None,
            closed_at: None,
        }
    }
}

/// Ensure the election control singleton exists, creating it closed if absent.
///
/// Idempotent; a concurrent creation losing the `_id` race is not an error.
pub async fn ensure_election_control_exists(
    controls: &Coll<ElectionControl>,
) -> Result<(), DbError> {
    if controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .is_none()
    {
        match controls.insert_one(ElectionControl::default(), None).await {
            Ok(_) => debug!("Created election control singleton"),
            Err(err) if is_duplicate_key_error(&err) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
