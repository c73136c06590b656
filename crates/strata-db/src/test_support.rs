//! Session double that records every call

use crate::error::{DbError, DbResult};
use crate::session::{Param, Session};

#[derive(Default)]
pub(crate) struct RecordingSession {
    pub calls: Vec<String>,
    pub fail_unlock: bool,
    pub fail_lock: bool,
}

impl Session for RecordingSession {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    fn execute(&mut self, sql: &str, _params: &[Param]) -> DbResult<u64> {
        self.calls.push(sql.to_string());
        Ok(0)
    }

    fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.calls.push(sql.to_string());
        Ok(())
    }

    fn query_i64(&mut self, sql: &str, _params: &[Param]) -> DbResult<Option<i64>> {
        self.calls.push(sql.to_string());
        Ok(None)
    }

    fn advisory_lock(&mut self, key: i64) -> DbResult<()> {
        if self.fail_lock {
            return Err(DbError::LockError("lock refused".to_string()));
        }
        self.calls.push(format!("lock {key}"));
        Ok(())
    }

    fn advisory_unlock(&mut self, key: i64) -> DbResult<()> {
        self.calls.push(format!("unlock {key}"));
        if self.fail_unlock {
            return Err(DbError::LockError("unlock refused".to_string()));
        }
        Ok(())
    }

    fn reset_session(&mut self) -> DbResult<()> {
        self.calls.push("reset".to_string());
        Ok(())
    }

    fn prepend_search_path(&mut self, schema: &str) -> DbResult<()> {
        self.calls.push(format!("search_path {schema}"));
        Ok(())
    }

    fn table_exists(&mut self, _name: &str) -> DbResult<bool> {
        Ok(false)
    }
}
