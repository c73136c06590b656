//! Migration steps.
//!
//! A step moves the schema from `sequence - 1` to `sequence` (up) and
//! optionally back (down). [`SqlStep`] holds rendered SQL; [`FuncStep`] runs
//! caller supplied code against the session.

use crate::discovery::disable_tx_regex;
use crate::error::{MigrateError, MigrateResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use strata_db::Session;
use strata_sql::split_statements;

/// Which way a step is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine tells a step about the run it is part of
pub struct StepContext<'a> {
    /// The engine opened a transaction around this step
    pub in_transaction: bool,
    /// Set when the run should stop at the next statement boundary
    pub cancel: &'a AtomicBool,
}

impl StepContext<'_> {
    /// Fail with [`MigrateError::Cancelled`] if cancellation was requested
    pub fn check_cancelled(&self) -> MigrateResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(MigrateError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One schema state transition
pub trait MigrationStep {
    /// Version the schema is at after applying this step up
    fn sequence(&self) -> i32;

    fn name(&self) -> &str;

    /// Whether `direction` must run outside a transaction
    fn disable_tx(&self, direction: Direction) -> bool;

    /// SQL reported to the on-start callback, if this is a SQL step
    fn sql(&self, direction: Direction) -> Option<&str>;

    /// Whether the step can be reversed
    fn has_down(&self) -> bool;

    fn up(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()>;

    fn down(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()>;

    /// Check the step is runnable; called before any database work
    fn validate(&self) -> MigrateResult<()> {
        Ok(())
    }
}

/// A direction's SQL with the disable-tx marker removed
#[derive(Debug, Clone, PartialEq, Eq)]
struct SqlBody {
    sql: String,
    disable_tx: bool,
}

impl SqlBody {
    fn parse(raw: &str) -> Option<Self> {
        let re = disable_tx_regex();
        let disable_tx = re.is_match(raw);
        let sql = if disable_tx {
            re.replace_all(raw, "").trim().to_string()
        } else {
            raw.trim().to_string()
        };
        if sql.is_empty() {
            None
        } else {
            Some(Self { sql, disable_tx })
        }
    }
}

/// Migration defined by SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStep {
    sequence: i32,
    name: String,
    up: Option<SqlBody>,
    down: Option<SqlBody>,
}

impl SqlStep {
    /// Build a step from rendered SQL. An empty `down` makes the step
    /// irreversible.
    pub fn new(sequence: i32, name: impl Into<String>, up: &str, down: &str) -> Self {
        Self {
            sequence,
            name: name.into(),
            up: SqlBody::parse(up),
            down: SqlBody::parse(down),
        }
    }

    fn body(&self, direction: Direction) -> Option<&SqlBody> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }

    fn run(
        &self,
        session: &mut dyn Session,
        ctx: &StepContext<'_>,
        direction: Direction,
    ) -> MigrateResult<()> {
        let body = self.body(direction).ok_or_else(|| self.missing(direction))?;

        // Inside a transaction the body goes to the server as one unit so
        // error positions refer to the whole text.
        let statements = if ctx.in_transaction {
            vec![body.sql.as_str()]
        } else {
            split_statements(&body.sql)
        };

        for statement in statements {
            ctx.check_cancelled()?;
            log::debug!("{} {}: {}", self.name, direction, statement);
            session
                .execute_batch(statement)
                .map_err(|source| MigrateError::MigrationExecution {
                    name: self.name.clone(),
                    statement: statement.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn missing(&self, direction: Direction) -> MigrateError {
        match direction {
            Direction::Up => MigrateError::InvalidStep {
                sequence: self.sequence,
                name: self.name.clone(),
                reason: "no up SQL".to_string(),
            },
            Direction::Down => MigrateError::IrreversibleMigration {
                sequence: self.sequence,
                name: self.name.clone(),
            },
        }
    }
}

impl MigrationStep for SqlStep {
    fn sequence(&self) -> i32 {
        self.sequence
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn disable_tx(&self, direction: Direction) -> bool {
        self.body(direction).is_some_and(|b| b.disable_tx)
    }

    fn sql(&self, direction: Direction) -> Option<&str> {
        self.body(direction).map(|b| b.sql.as_str())
    }

    fn has_down(&self) -> bool {
        self.down.is_some()
    }

    fn up(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()> {
        self.run(session, ctx, Direction::Up)
    }

    fn down(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()> {
        self.run(session, ctx, Direction::Down)
    }

    fn validate(&self) -> MigrateResult<()> {
        if self.up.is_none() {
            return Err(self.missing(Direction::Up));
        }
        Ok(())
    }
}

/// Function run by a [`FuncStep`]
pub type StepFn = Box<dyn Fn(&mut dyn Session) -> MigrateResult<()>>;

/// Migration defined by code
pub struct FuncStep {
    sequence: i32,
    name: String,
    up: StepFn,
    down: Option<StepFn>,
    disable_tx: bool,
}

impl FuncStep {
    pub fn new<F>(sequence: i32, name: impl Into<String>, up: F) -> Self
    where
        F: Fn(&mut dyn Session) -> MigrateResult<()> + 'static,
    {
        Self {
            sequence,
            name: name.into(),
            up: Box::new(up),
            down: None,
            disable_tx: false,
        }
    }

    /// Make the step reversible
    pub fn with_down<F>(mut self, down: F) -> Self
    where
        F: Fn(&mut dyn Session) -> MigrateResult<()> + 'static,
    {
        self.down = Some(Box::new(down));
        self
    }

    /// Run both directions outside of a transaction
    pub fn without_tx(mut self) -> Self {
        self.disable_tx = true;
        self
    }
}

impl fmt::Debug for FuncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncStep")
            .field("sequence", &self.sequence)
            .field("name", &self.name)
            .field("has_down", &self.down.is_some())
            .field("disable_tx", &self.disable_tx)
            .finish()
    }
}

impl MigrationStep for FuncStep {
    fn sequence(&self) -> i32 {
        self.sequence
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn disable_tx(&self, _direction: Direction) -> bool {
        self.disable_tx
    }

    fn sql(&self, _direction: Direction) -> Option<&str> {
        None
    }

    fn has_down(&self) -> bool {
        self.down.is_some()
    }

    fn up(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()> {
        ctx.check_cancelled()?;
        (self.up)(session)
    }

    fn down(&self, session: &mut dyn Session, ctx: &StepContext<'_>) -> MigrateResult<()> {
        ctx.check_cancelled()?;
        match &self.down {
            Some(down) => down(session),
            None => Err(MigrateError::IrreversibleMigration {
                sequence: self.sequence,
                name: self.name.clone(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
