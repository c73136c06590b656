//! Error types for strata-db

use std::fmt;
use thiserror::Error;

/// Structured error reported by the database server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlErrorInfo {
    /// Primary human readable message
    pub message: String,
    /// SQLSTATE code, when the backend reports one
    pub code: Option<String>,
    /// Optional secondary message
    pub detail: Option<String>,
    /// Optional suggestion
    pub hint: Option<String>,
    /// 1-based character offset into the submitted SQL
    pub position: Option<usize>,
}

impl SqlErrorInfo {
    /// Error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for SqlErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "ERROR: {} (SQLSTATE {})", self.message, code),
            None => write!(f, "ERROR: {}", self.message),
        }
    }
}

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement rejected by the server (D002)
    #[error("[D002] {0}")]
    Sql(SqlErrorInfo),

    /// Driver level query failure (D003)
    #[error("[D003] Query failed: {0}")]
    QueryError(String),

    /// Advisory lock failure (D004)
    #[error("[D004] Advisory lock error: {0}")]
    LockError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// The server error details, if this is a SQL error
    pub fn sql_info(&self) -> Option<&SqlErrorInfo> {
        match self {
            DbError::Sql(info) => Some(info),
            _ => None,
        }
    }
}

impl From<postgres::Error> for DbError {
    fn from(err: postgres::Error) -> Self {
        if let Some(db) = err.as_db_error() {
            let position = match db.position() {
                Some(postgres::error::ErrorPosition::Original(p)) => Some(*p as usize),
                _ => None,
            };
            return DbError::Sql(SqlErrorInfo {
                message: db.message().to_string(),
                code: Some(db.code().code().to_string()),
                detail: db.detail().map(String::from),
                hint: db.hint().map(String::from),
                position,
            });
        }
        if err.is_closed() {
            DbError::ConnectionError(err.to_string())
        } else {
            DbError::QueryError(err.to_string())
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // DuckDB reports neither SQLSTATE nor an error offset.
        match err {
            duckdb::Error::DuckDBFailure(_, Some(message)) => {
                DbError::Sql(SqlErrorInfo::new(message))
            }
            other => DbError::QueryError(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
