mod request;
mod token;
mod user;

pub use request::{IdpClaims, VoterAssertion};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{AccessLevel, User, Voter};

#[cfg(test)]
pub use request::EXAMPLE_VOTER_ID;
