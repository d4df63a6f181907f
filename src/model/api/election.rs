use serde::{Deserialize, Serialize};

use crate::model::db::election::ElectionControl;

/// Admin request to retitle the election and open or close balloting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ElectionControlSpec {
    pub title: String,
    pub is_open: bool,
}

/// Public view of the election control state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionStatus {
    pub title: String,
    pub is_open: bool,
}

impl From<&ElectionControl> for ElectionStatus {
    fn from(control: &ElectionControl) -> Self {
        Self {
            title: control.title.clone(),
            is_open: control.is_open,
        }
    }
}
