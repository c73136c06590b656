//! The migration engine.
//!
//! [`Migrator::migrate_to`] takes the advisory lock, reads the stored
//! version and applies one step at a time towards the target. Each step runs
//! in its own transaction unless transactions are disabled globally or by
//! the step, and the stored version is updated before that transaction
//! commits.

use crate::discovery::load_migrations;
use crate::error::{MigrateError, MigrateResult};
use crate::migration::{Direction, MigrationStep, SqlStep, StepContext};
use crate::source::MigrationSource;
use crate::version::VersionTable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_db::{AdvisoryLock, Session, Transaction};
use strata_jinja::{Data, TemplateRenderer};

/// Engine settings fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorOptions {
    /// Run every step outside of a transaction
    pub disable_tx: bool,
    /// Version table name, ideally schema qualified
    pub version_table: String,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            disable_tx: false,
            version_table: "public.schema_version".to_string(),
        }
    }
}

/// Callback fired before each step with `(sequence, name, direction, sql)`.
/// `sql` is empty for function steps.
pub type OnStart = Box<dyn Fn(i32, &str, Direction, &str)>;

/// Where the database stands relative to the loaded migrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub current_version: i32,
    pub last_version: i32,
}

impl MigrationStatus {
    /// Steps still to apply to reach the last migration
    pub fn pending(&self) -> i32 {
        (self.last_version - self.current_version).max(0)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.current_version == self.last_version
    }
}

/// Applies an ordered list of migration steps to a database
pub struct Migrator {
    options: MigratorOptions,
    version_table: VersionTable,
    steps: Vec<Box<dyn MigrationStep>>,
    on_start: Option<OnStart>,
    cancel: Arc<AtomicBool>,
}

impl Migrator {
    pub fn new(options: MigratorOptions) -> Self {
        let version_table = VersionTable::new(options.version_table.clone());
        Self {
            options,
            version_table,
            steps: Vec::new(),
            on_start: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    pub fn version_table(&self) -> &VersionTable {
        &self.version_table
    }

    /// Loaded steps, indexed by `sequence - 1`
    pub fn migrations(&self) -> &[Box<dyn MigrationStep>] {
        &self.steps
    }

    /// Sequence of the last step, or 0 with no steps
    pub fn last_sequence(&self) -> i32 {
        self.steps.len() as i32
    }

    /// Flag that stops a run at the next statement or step boundary.
    /// Set it from another thread (a signal handler, for instance).
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Use a flag created elsewhere as the cancel handle
    pub fn with_cancel_handle(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Register the callback fired before every step
    pub fn on_start<F>(&mut self, callback: F)
    where
        F: Fn(i32, &str, Direction, &str) + 'static,
    {
        self.on_start = Some(Box::new(callback));
    }

    /// Discover and render migrations from `source`, appending them in order
    pub fn load_migrations(
        &mut self,
        source: &dyn MigrationSource,
        renderer: &mut dyn TemplateRenderer,
        data: &Data,
    ) -> MigrateResult<()> {
        if !self.steps.is_empty() {
            return Err(MigrateError::MigrationsAlreadyLoaded {
                count: self.steps.len(),
            });
        }
        for step in load_migrations(source, renderer, data)? {
            self.steps.push(Box::new(step));
        }
        log::debug!("Loaded {} migrations", self.steps.len());
        Ok(())
    }

    /// Append a SQL migration numbered after the existing ones
    pub fn append_migration(&mut self, name: impl Into<String>, up: &str, down: &str) {
        let sequence = self.last_sequence() + 1;
        self.steps
            .push(Box::new(SqlStep::new(sequence, name, up, down)));
    }

    /// Append a prebuilt step. Its sequence must follow the last one.
    pub fn append_step(&mut self, step: Box<dyn MigrationStep>) -> MigrateResult<()> {
        let expected = self.last_sequence() + 1;
        if step.sequence() != expected {
            return Err(MigrateError::InvalidStep {
                sequence: step.sequence(),
                name: step.name().to_string(),
                reason: format!("expected sequence {expected}"),
            });
        }
        self.steps.push(step);
        Ok(())
    }

    fn validate(&self) -> MigrateResult<()> {
        self.steps.iter().try_for_each(|step| step.validate())
    }

    /// Create and seed the version table if it does not exist
    pub fn ensure_version_table(&self, session: &mut dyn Session) -> MigrateResult<()> {
        self.version_table.ensure(session)
    }

    /// Read the stored version
    pub fn current_version(&self, session: &mut dyn Session) -> MigrateResult<i32> {
        self.version_table.current(session)
    }

    /// Current and last versions, creating the version table if needed
    pub fn status(&self, session: &mut dyn Session) -> MigrateResult<MigrationStatus> {
        self.ensure_version_table(session)?;
        Ok(MigrationStatus {
            current_version: self.current_version(session)?,
            last_version: self.last_sequence(),
        })
    }

    /// Apply every pending step
    pub fn migrate(&mut self, session: &mut dyn Session) -> MigrateResult<()> {
        let last = self.last_sequence();
        self.migrate_to(session, last)
    }

    /// Move the database to `target`, which must be within `0..=N`
    pub fn migrate_to(&mut self, session: &mut dyn Session, target: i32) -> MigrateResult<()> {
        self.validate()?;

        let last = self.last_sequence();
        if !(0..=last).contains(&target) {
            return Err(MigrateError::BadVersion(format!(
                "destination version {target} is outside the valid versions of 0 to {last}"
            )));
        }

        let mut lock = AdvisoryLock::acquire(session)?;
        let result = self.migrate_locked(&mut *lock, target);
        let released = lock.release();
        if let (Err(_), Err(unlock_err)) = (&result, &released) {
            log::warn!("Failed to release advisory lock: {}", unlock_err);
        }
        result?;
        released?;
        Ok(())
    }

    fn migrate_locked(&self, session: &mut dyn Session, target: i32) -> MigrateResult<()> {
        self.version_table.ensure_locked(session)?;

        let last = self.last_sequence();
        let mut current = self.version_table.current(session)?;
        if !(0..=last).contains(&current) {
            return Err(MigrateError::BadVersion(format!(
                "current version {current} is outside the valid versions of 0 to {last}"
            )));
        }

        if current == target {
            log::info!("Already at version {}", current);
            return Ok(());
        }

        let direction = if current < target {
            Direction::Up
        } else {
            Direction::Down
        };

        while current != target {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(MigrateError::Cancelled);
            }

            let (step, next) = match direction {
                Direction::Up => (&self.steps[current as usize], current + 1),
                Direction::Down => (&self.steps[current as usize - 1], current - 1),
            };
            if direction == Direction::Down && !step.has_down() {
                return Err(MigrateError::IrreversibleMigration {
                    sequence: step.sequence(),
                    name: step.name().to_string(),
                });
            }

            let use_tx = !self.options.disable_tx && !step.disable_tx(direction);
            log::info!(
                "Applying {} {} ({})",
                step.name(),
                direction,
                if use_tx { "transaction" } else { "no transaction" }
            );

            if use_tx {
                let mut tx = Transaction::begin(&mut *session)?;
                self.apply(&mut *tx, step.as_ref(), direction, next, true)?;
                tx.commit()
                    .map_err(|source| MigrateError::MigrationExecution {
                        name: step.name().to_string(),
                        statement: "commit".to_string(),
                        source,
                    })?;
            } else {
                self.apply(&mut *session, step.as_ref(), direction, next, false)?;
            }

            current = next;
        }

        Ok(())
    }

    fn apply(
        &self,
        session: &mut dyn Session,
        step: &dyn MigrationStep,
        direction: Direction,
        next_version: i32,
        in_transaction: bool,
    ) -> MigrateResult<()> {
        if let Some(on_start) = &self.on_start {
            on_start(
                step.sequence(),
                step.name(),
                direction,
                step.sql(direction).unwrap_or_default(),
            );
        }

        let ctx = StepContext {
            in_transaction,
            cancel: &self.cancel,
        };
        match direction {
            Direction::Up => step.up(session, &ctx)?,
            Direction::Down => step.down(session, &ctx)?,
        }

        // Steps may change search_path; reset before touching the version table.
        session.reset_session()?;
        self.version_table.set(session, next_version)
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
