//! DuckDB session backend

use crate::error::{DbError, DbResult};
use crate::session::{Param, Session};
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use strata_core::sql_utils::{quote_literal, split_qualified_name};

/// DuckDB session.
///
/// A DuckDB database file admits a single writing process, so the advisory
/// lock calls succeed without doing anything. `reset_session` only resets the
/// search path.
pub struct DuckDbSession {
    conn: Connection,
}

impl DuckDbSession {
    /// Open a new in-memory database
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open (or create) a database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open from a path string (handles `:memory:`)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }
}

fn to_values(params: &[Param]) -> Vec<Value> {
    params
        .iter()
        .map(|p| match p {
            Param::Int(v) => Value::Int(*v),
            Param::BigInt(v) => Value::BigInt(*v),
            Param::Text(s) => Value::Text(s.clone()),
        })
        .collect()
}

impl Session for DuckDbSession {
    fn backend_name(&self) -> &'static str {
        "duckdb"
    }

    fn execute(&mut self, sql: &str, params: &[Param]) -> DbResult<u64> {
        let affected = self.conn.execute(sql, params_from_iter(to_values(params)))?;
        Ok(affected as u64)
    }

    fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query_i64(&mut self, sql: &str, params: &[Param]) -> DbResult<Option<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(to_values(params)))?;
        let value = match rows.next()? {
            Some(row) => Some(row.get::<_, i64>(0)?),
            None => None,
        };
        Ok(value)
    }

    fn advisory_lock(&mut self, key: i64) -> DbResult<()> {
        log::debug!("duckdb: advisory lock {} is implied by the file lock", key);
        Ok(())
    }

    fn advisory_unlock(&mut self, _key: i64) -> DbResult<()> {
        Ok(())
    }

    fn reset_session(&mut self) -> DbResult<()> {
        self.conn.execute_batch("RESET search_path")?;
        Ok(())
    }

    fn prepend_search_path(&mut self, schema: &str) -> DbResult<()> {
        let current: Option<String> =
            self.conn
                .query_row("select current_setting('search_path')", [], |row| row.get(0))?;
        let rest = match current.as_deref() {
            Some(path) if !path.trim().is_empty() => path.to_string(),
            _ => "main".to_string(),
        };
        let path = format!("{schema},{rest}");
        self.conn
            .execute_batch(&format!("SET search_path = {}", quote_literal(&path)))?;
        Ok(())
    }

    fn table_exists(&mut self, name: &str) -> DbResult<bool> {
        let count = match split_qualified_name(name) {
            (Some(schema), table) => self.query_i64(
                "select count(*) from information_schema.tables \
                 where table_schema = $1 and table_name = $2 and table_type = 'BASE TABLE'",
                &[Param::Text(schema.to_string()), Param::Text(table.to_string())],
            )?,
            (None, table) => self.query_i64(
                "select count(*) from information_schema.tables \
                 where table_schema = current_schema() and table_name = $1 \
                 and table_type = 'BASE TABLE'",
                &[Param::Text(table.to_string())],
            )?,
        };
        Ok(count.unwrap_or(0) > 0)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
