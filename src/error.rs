//! Error types for the SQL engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Any malformed query, unknown table or column, type mismatch, or
    /// constraint violation. Carries a human-readable message.
    #[error("{0}")]
    InvalidQuery(String),

    /// Filesystem or socket errors, surfaced with their native message.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building an [`Error::InvalidQuery`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }
}
