//! strata-sql - SQL text utilities for Strata
//!
//! This crate splits a blob of SQL into individually executable statements
//! and maps server-reported character positions back to a line and column
//! of the offending statement. It does not parse SQL.

pub mod error;
pub mod position;
pub mod split;

pub use error::{SqlError, SqlResult};
pub use position::{extract_error_line, ErrorLine};
pub use split::split_statements;
