//! strata-db - Database sessions for Strata
//!
//! This crate provides the synchronous [`Session`] trait the migrator runs
//! against, a PostgreSQL implementation built on the `postgres` crate, a
//! DuckDB implementation used for local runs and tests, and RAII guards for
//! the advisory lock and transactions.

pub mod duckdb;
pub mod error;
pub mod lock;
pub mod postgres;
pub mod session;
pub mod transaction;

pub use duckdb::DuckDbSession;
pub use error::{DbError, DbResult, SqlErrorInfo};
pub use lock::{AdvisoryLock, LOCK_KEY};
pub use postgres::PostgresSession;
pub use session::{Param, Session};
pub use transaction::Transaction;

#[cfg(test)]
pub(crate) mod test_support;
