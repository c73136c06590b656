//! Database session trait

use crate::error::DbResult;

/// Statement parameter bound to `$1`, `$2`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i32),
    BigInt(i64),
    Text(String),
}

/// A single open database connection.
///
/// Sessions are used from one thread at a time and every call blocks until
/// the server answers. Transaction control is plain `begin`/`commit`/
/// `rollback` SQL so a step can run inside or outside a transaction on the
/// same session.
pub trait Session {
    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;

    /// Execute one parameterised statement, returning affected rows
    fn execute(&mut self, sql: &str, params: &[Param]) -> DbResult<u64>;

    /// Execute one or more statements without parameters
    fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// Query the first column of the first row as an integer
    ///
    /// Returns `None` when the query yields no rows.
    fn query_i64(&mut self, sql: &str, params: &[Param]) -> DbResult<Option<i64>>;

    /// Take the session-scoped advisory lock `key`, blocking until granted
    fn advisory_lock(&mut self, key: i64) -> DbResult<()>;

    /// Release the session-scoped advisory lock `key`
    fn advisory_unlock(&mut self, key: i64) -> DbResult<()>;

    /// Reset session settings (search_path and friends) to their defaults
    fn reset_session(&mut self) -> DbResult<()>;

    /// Put `schema` in front of the search path. On PostgreSQL the change
    /// lasts until the end of the current transaction; DuckDB keeps it until
    /// [`Session::reset_session`].
    fn prepend_search_path(&mut self, schema: &str) -> DbResult<()>;

    /// Whether a table named `name` exists. An unqualified name is resolved
    /// through the session's search path.
    fn table_exists(&mut self, name: &str) -> DbResult<bool>;

    fn begin(&mut self) -> DbResult<()> {
        self.execute_batch("begin")
    }

    fn commit(&mut self) -> DbResult<()> {
        self.execute_batch("commit")
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.execute_batch("rollback")
    }
}
