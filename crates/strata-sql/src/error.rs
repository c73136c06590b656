//! Error types for strata-sql

use thiserror::Error;

/// SQL text processing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SqlError {
    /// Reported position does not fall inside the statement (S001)
    #[error("[S001] Position {position} is outside the statement (length {length})")]
    PositionOutOfRange { position: usize, length: usize },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
