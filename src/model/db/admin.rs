use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::admin::AdminCredentials,
    mongodb::{Coll, Id},
};

/// Username of the admin account created on first launch.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create an AdminCore is via
        // TryFrom<AdminCredentials>, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// An admin without an ID, ready for insertion.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Ensure there is at least one admin account, creating the default one with
/// the configured password if the collection is empty.
pub async fn ensure_admin_exists(admins: &Coll<NewAdmin>, default_password: &str) -> Result<()> {
    let count = admins.count_documents(None, None).await?;
    if count == 0 {
        let admin = NewAdmin::try_from(AdminCredentials {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: default_password.to_string(),
        })?;
        admins.insert_one(admin, None).await?;
        warn!("Created default admin account '{DEFAULT_ADMIN_USERNAME}'; change its password");
    }
    Ok(())
}
