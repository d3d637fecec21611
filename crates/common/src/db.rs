//! Shared data-store error type
//!
//! Every repository trait in the domain crates returns `RepositoryError`, whether
//! it is backed by PostgreSQL or by the in-memory store used in tests.

use crate::error::Error;
use thiserror::Error;

/// Data-store error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Validation(msg),
            RepositoryError::Unavailable(msg) => Error::Internal(msg),
        }
    }
}
