use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::db::admin::Admin;

/// A user of the portal, having a defined access level.
pub trait User {
    /// The access level of this user type.
    const LEVEL: AccessLevel;
}

/// Numeric access levels, as used throughout the portal.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AccessLevel {
    Voter = 1,
    Admin = 2,
}

impl Display for AccessLevel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

/// Marker type for voter sessions. Voters have no stored entity of their own;
/// their identity is whatever the identity provider asserted.
pub struct Voter;

impl User for Voter {
    const LEVEL: AccessLevel = AccessLevel::Voter;
}

impl User for Admin {
    const LEVEL: AccessLevel = AccessLevel::Admin;
}
