//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL details out of the services.
//!
//! # Invariants
//! - Domain failures (`SessionNotFound`, `AlreadySubmitted`) are typed here,
//!   at the storage boundary, and never inferred from message text.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::session::SessionId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod demographics_repo;
pub mod participant_repo;
pub mod session_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every repository in this crate.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No writing session with this id exists.
    SessionNotFound(SessionId),
    /// The session's `submitted_at` was already set.
    AlreadySubmitted(SessionId),
    /// A persisted row cannot be mapped back to the domain model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::SessionNotFound(id) => write!(f, "writing session not found: {id}"),
            Self::AlreadySubmitted(id) => write!(f, "writing session already submitted: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn required_timestamp(
    value: &str,
    column: &str,
) -> RepoResult<chrono::DateTime<chrono::Utc>> {
    crate::model::timestamp::parse_timestamp(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}"))
    })
}
