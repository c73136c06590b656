//! Error types for strata-migrate

use strata_db::{DbError, SqlErrorInfo};
use strata_jinja::JinjaError;
use strata_sql::{extract_error_line, ErrorLine};
use thiserror::Error;

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Requested or stored version outside `0..=N` (M001)
    #[error("[M001] {0}")]
    BadVersion(String),

    /// Down step requested for a migration without one (M002)
    #[error("[M002] Irreversible migration: {sequence} - {name}")]
    IrreversibleMigration { sequence: i32, name: String },

    /// Nothing to run (M003)
    #[error("[M003] Migrations not found")]
    NoMigrationsFound,

    /// Up body is blank or comments only (M004)
    #[error("[M004] No SQL in forward migration step: {name}")]
    NoForwardSql { name: String },

    /// Two files claim one sequence number (M005)
    #[error("[M005] Duplicate migration {0}")]
    DuplicateMigration(i32),

    /// Gap in the sequence numbers (M006)
    #[error("[M006] Missing migration {0}")]
    MissingMigration(i32),

    /// A statement of a migration step failed (M007)
    #[error("[M007] {name}: {source}")]
    MigrationExecution {
        name: String,
        statement: String,
        #[source]
        source: DbError,
    },

    /// Template rendering failed (M008)
    #[error("[M008] Template error in {file} ({direction}): {source}")]
    Template {
        file: String,
        direction: String,
        #[source]
        source: JinjaError,
    },

    /// Migration source could not be read (M009)
    #[error("[M009] Failed to read '{path}': {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Interrupted between statements or steps (M010)
    #[error("[M010] Migration cancelled")]
    Cancelled,

    /// Version table has no row (M011)
    #[error("[M011] Version table {table} has no version row")]
    VersionTableMissing { table: String },

    /// Incoherent step definition (M012)
    #[error("[M012] Invalid migration step {sequence} ({name}): {reason}")]
    InvalidStep {
        sequence: i32,
        name: String,
        reason: String,
    },

    /// Code package could not be loaded (M013)
    #[error("[M013] Code package error: {0}")]
    CodePackage(String),

    /// A code package file failed to install (M014)
    #[error("[M014] {file}: {source}")]
    CodeInstall {
        file: String,
        statement: String,
        #[source]
        source: DbError,
    },

    /// `load_migrations` called on a migrator that already has steps (M015)
    #[error("[M015] Migrations were already loaded or appended ({count} steps)")]
    MigrationsAlreadyLoaded { count: usize },

    /// Database error outside of a migration statement
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// Server error details for a failed statement, if any
    pub fn sql_info(&self) -> Option<&SqlErrorInfo> {
        match self {
            MigrateError::MigrationExecution { source, .. }
            | MigrateError::CodeInstall { source, .. } => source.sql_info(),
            MigrateError::Db(source) => source.sql_info(),
            _ => None,
        }
    }

    /// The SQL text that failed, if any
    pub fn statement(&self) -> Option<&str> {
        match self {
            MigrateError::MigrationExecution { statement, .. }
            | MigrateError::CodeInstall { statement, .. } => Some(statement),
            _ => None,
        }
    }

    /// Line and column of the failure within the failing statement, when
    /// the server reported a position
    pub fn sql_diagnostic(&self) -> Option<ErrorLine> {
        let position = self.sql_info()?.position?;
        let statement = self.statement()?;
        extract_error_line(statement, position).ok()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
