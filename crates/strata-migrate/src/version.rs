//! Persisted schema version.
//!
//! The version table holds exactly one row with one `version` column. It is
//! created and seeded under the advisory lock so concurrent migrators never
//! insert a second row.

use crate::error::{MigrateError, MigrateResult};
use strata_core::sql_utils::quote_qualified;
use strata_db::{AdvisoryLock, Param, Session};

/// The single-row version table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTable {
    name: String,
    quoted: String,
}

impl VersionTable {
    /// `name` may be schema qualified (`public.schema_version`)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let quoted = quote_qualified(&name);
        Self { name, quoted }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create and seed the table if needed, taking the advisory lock
    pub fn ensure(&self, session: &mut dyn Session) -> MigrateResult<()> {
        let mut lock = AdvisoryLock::acquire(session)?;
        let result = self.ensure_locked(&mut *lock);
        let released = lock.release();
        result?;
        released?;
        Ok(())
    }

    /// Create and seed the table if needed. The caller holds the lock.
    pub(crate) fn ensure_locked(&self, session: &mut dyn Session) -> MigrateResult<()> {
        if session.table_exists(&self.name)? {
            return Ok(());
        }
        log::info!("Creating version table {}", self.name);
        session.execute_batch(&format!(
            "create table if not exists {t}(version int4 not null);\n\
             insert into {t}(version) select 0 where 0 = (select count(*) from {t});",
            t = self.quoted
        ))?;
        Ok(())
    }

    /// Read the current version
    pub fn current(&self, session: &mut dyn Session) -> MigrateResult<i32> {
        let version = session
            .query_i64(&format!("select version from {}", self.quoted), &[])?
            .ok_or_else(|| MigrateError::VersionTableMissing {
                table: self.name.clone(),
            })?;
        i32::try_from(version).map_err(|_| {
            MigrateError::BadVersion(format!("stored version {version} is not a valid version"))
        })
    }

    /// Overwrite the stored version
    pub fn set(&self, session: &mut dyn Session, version: i32) -> MigrateResult<()> {
        session.execute(
            &format!("update {} set version = $1", self.quoted),
            &[Param::Int(version)],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
