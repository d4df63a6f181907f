use argon2::Config;
use rand::Rng;
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::db::admin::NewAdmin;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored
/// directly, since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = Error;

    /// Convert [`AdminCredentials`] to a new [`NewAdmin`] by hashing the
    /// password, enforcing a non-empty username and minimum password length.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        if cred.username.is_empty() {
            return Err(Error::Status(
                Status::BadRequest,
                "Admin username must not be empty".to_string(),
            ));
        }
        if cred.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::Status(
                Status::BadRequest,
                format!("Admin password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        // 16 bytes is the recommended salt size for argon2.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Config::default()).unwrap(); // Safe because the default `Config` is valid.
        Ok(Self {
            username: cred.username,
            password_hash,
        })
    }
}
