use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::admin::Admin,
    mongodb::{Coll, Id},
};

use super::user::{AccessLevel, User, Voter};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token representing a specific user at a specific access
/// level.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<U> {
    /// The subject: an admin document ID, or a voter identifier from the
    /// identity provider.
    pub sub: String,
    #[serde(rename = "lvl")]
    pub level: AccessLevel,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// Does this token permit the given access level?
    pub fn permits(&self, target: AccessLevel) -> bool {
        self.level == target
    }
}

impl AuthToken<Admin> {
    /// Create a new [`AuthToken`] for the given admin.
    pub fn for_admin(admin: &Admin) -> Self {
        Self {
            sub: admin.id.to_string(),
            level: AccessLevel::Admin,
            phantom: PhantomData,
        }
    }
}

impl AuthToken<Voter> {
    /// Create a new [`AuthToken`] for the given voter identity.
    pub fn for_voter(voter_id: impl Into<String>) -> Self {
        Self {
            sub: voter_id.into(),
            level: AccessLevel::Voter,
            phantom: PhantomData,
        }
    }

    /// The voter identifier this token represents.
    pub fn voter_id(&self) -> &str {
        &self.sub
    }
}

impl<U> AuthToken<U>
where
    U: User,
{
    #[allow(clippy::missing_panics_doc)]
    /// Serialise this token into a session cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialise a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and verify that it carries the
    /// access level for this user type.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        // Forward to any routes that do not require an authentication token.
        let cookie = try_outcome!(req.cookies().get(AUTH_TOKEN_COOKIE).or_forward(()));

        // Decode the token.
        let token: Self = try_outcome!(Self::from_cookie(cookie, config).or_forward(()));

        // Check it represents the correct access level.
        if !token.permits(U::LEVEL) {
            return Outcome::Forward(());
        }

        match token.level {
            // Voters have no stored entity to check against; the identity
            // provider already vouched for them.
            AccessLevel::Voter => Outcome::Success(token),
            // Admin accounts can be deleted, so check the admin still exists.
            AccessLevel::Admin => {
                let admin_id = match token.sub.parse::<Id>() {
                    Ok(id) => id,
                    Err(_) => return Outcome::Forward(()),
                };
                let db = req.guard::<&State<mongodb::Database>>().await.unwrap();
                let admin = Coll::<Admin>::from_db(db)
                    .find_one(admin_id.as_doc(), None)
                    .await;
                match admin {
                    Ok(Some(_)) => Outcome::Success(token),
                    Ok(None) => Outcome::Forward(()),
                    Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
                }
            }
        }
    }
}
