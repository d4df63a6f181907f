use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::db::ballot::CastError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    BsonSer(#[from] mongodb::bson::ser::Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 with a useful message.
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// A 401 with a useful message.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, msg.into())
    }
}

impl From<CastError> for Error {
    /// Map a cast rejection onto a status code, so every failure kind stays
    /// distinguishable at the HTTP layer.
    fn from(err: CastError) -> Self {
        let message = err.to_string();
        match err {
            CastError::BallotingClosed => Self::Status(Status::Forbidden, message),
            CastError::AlreadyVoted => Self::Status(Status::Conflict, message),
            CastError::CandidateNotFound(_) => Self::Status(Status::NotFound, message),
            // Retryable by the caller; a retry after the first attempt
            // actually landed resolves to `AlreadyVoted`, never a double
            // count.
            CastError::TransientConflict(_) => Self::Status(Status::ServiceUnavailable, message),
            CastError::Db(e) => Self::Db(e),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        Err(match self {
            Self::Db(_) | Self::BsonSer(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.into_kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
                | jsonwebtoken::errors::ErrorKind::ImmatureSignature => Status::Unauthorized,
                _ => Status::BadRequest,
            },
            Self::Status(status, _) => status,
        })
    }
}
