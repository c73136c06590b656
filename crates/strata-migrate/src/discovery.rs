//! Migration discovery and loading.
//!
//! Top-level files named `NNN_description.sql` are migrations; `.sql` files
//! in subdirectories are shared partials available to every migration by
//! their relative path. Each directory under `snapshots/` is a frozen code
//! package that a migration installs with `install_snapshot("<id>")`.

use crate::code::CodePackage;
use crate::error::{MigrateError, MigrateResult};
use crate::migration::{Direction, SqlStep};
use crate::source::{MigrationSource, SubSource};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use strata_jinja::{Data, TemplateRenderer};

/// Separates the up SQL from the down SQL in a migration file
pub const SPLIT_MARKER: &str = "---- create above / drop below ----";

/// Line that makes a direction run outside of a transaction. The
/// `---- tern: disable-tx ----` spelling is accepted too.
pub const DISABLE_TX_MARKER: &str = "---- strata: disable-tx ----";

/// Directory holding code package snapshots, one subdirectory per id
pub const SNAPSHOTS_DIR: &str = "snapshots";

static MIGRATION_FILE_RE: OnceLock<Regex> = OnceLock::new();
static DISABLE_TX_RE: OnceLock<Regex> = OnceLock::new();

fn migration_file_regex() -> &'static Regex {
    MIGRATION_FILE_RE.get_or_init(|| Regex::new(r"\A(\d+)_.+\.sql\z").expect("valid regex"))
}

pub(crate) fn disable_tx_regex() -> &'static Regex {
    DISABLE_TX_RE.get_or_init(|| {
        Regex::new(r"(?m)^---- (?:strata|tern): disable-tx ----\r?$").expect("valid regex")
    })
}

/// Sequence number encoded in a migration file name, if it is one
fn parse_sequence(file_name: &str) -> Option<MigrateResult<i32>> {
    let captures = migration_file_regex().captures(file_name)?;
    let digits = captures.get(1)?.as_str();
    let parsed = match digits.parse::<i32>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err(MigrateError::BadVersion(format!(
            "migration {file_name} has sequence 0; numbering starts at 1"
        ))),
        Err(_) => Err(MigrateError::BadVersion(format!(
            "migration {file_name} has a sequence number that is too large"
        ))),
    };
    Some(parsed)
}

/// List the migration files at the top of `source`, ordered by sequence.
///
/// Directories and files that do not look like migrations are ignored. An
/// empty result is not an error here.
pub fn find_migrations(source: &dyn MigrationSource) -> MigrateResult<Vec<String>> {
    let mut by_sequence: BTreeMap<i32, String> = BTreeMap::new();

    for entry in source.list_dir("")? {
        if entry.is_dir {
            continue;
        }
        let Some(sequence) = parse_sequence(&entry.name) else {
            continue;
        };
        let sequence = sequence?;
        if by_sequence.insert(sequence, entry.name).is_some() {
            return Err(MigrateError::DuplicateMigration(sequence));
        }
    }

    // Keys are unique and start at 1 or later, so the first key that does
    // not match its position marks the gap.
    for (expected, &sequence) in (1..).zip(by_sequence.keys()) {
        if sequence != expected {
            return Err(MigrateError::MissingMigration(expected));
        }
    }

    Ok(by_sequence.into_values().collect())
}

/// Whether `sql` has a line that is neither blank nor a `--` comment
fn contains_sql(sql: &str) -> bool {
    sql.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

fn register_partials(
    source: &dyn MigrationSource,
    renderer: &mut dyn TemplateRenderer,
) -> MigrateResult<()> {
    for path in source.walk()? {
        if !path.contains('/') || !path.ends_with(".sql") {
            continue;
        }
        let body = source.read_file(&path)?;
        renderer
            .add_partial(&path, &body)
            .map_err(|source| MigrateError::Template {
                file: path.clone(),
                direction: "partial".to_string(),
                source,
            })?;
    }
    Ok(())
}

/// Evaluate every package under `snapshots/` so migrations can install it
fn register_snapshots(
    source: &dyn MigrationSource,
    renderer: &mut dyn TemplateRenderer,
    data: &Data,
) -> MigrateResult<()> {
    let has_snapshots = source
        .list_dir("")?
        .iter()
        .any(|entry| entry.is_dir && entry.name == SNAPSHOTS_DIR);
    if !has_snapshots {
        return Ok(());
    }

    for entry in source.list_dir(SNAPSHOTS_DIR)? {
        if !entry.is_dir {
            continue;
        }
        let dir = format!("{SNAPSHOTS_DIR}/{}", entry.name);
        let package = CodePackage::load(&SubSource::new(source, &dir), entry.name.as_str())?;
        let sql = package.eval_all(renderer, data)?;
        renderer
            .add_snapshot(&entry.name, &sql)
            .map_err(|source| MigrateError::Template {
                file: dir.clone(),
                direction: "snapshot".to_string(),
                source,
            })?;
    }
    Ok(())
}

fn render(
    renderer: &dyn TemplateRenderer,
    file: &str,
    direction: Direction,
    body: &str,
    data: &Data,
) -> MigrateResult<String> {
    renderer
        .render(&format!("{file} {direction}"), body, data)
        .map_err(|source| MigrateError::Template {
            file: file.to_string(),
            direction: direction.to_string(),
            source,
        })
}

/// Discover, render and validate every migration in `source`.
///
/// Fails with [`MigrateError::NoMigrationsFound`] when there are none.
pub fn load_migrations(
    source: &dyn MigrationSource,
    renderer: &mut dyn TemplateRenderer,
    data: &Data,
) -> MigrateResult<Vec<SqlStep>> {
    register_snapshots(source, renderer, data)?;
    register_partials(source, renderer)?;

    let paths = find_migrations(source)?;
    if paths.is_empty() {
        return Err(MigrateError::NoMigrationsFound);
    }

    let mut steps = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let body = source.read_file(path)?;
        let (up, down) = match body.split_once(SPLIT_MARKER) {
            Some((up, down)) => (up.trim(), down.trim()),
            None => (body.trim(), ""),
        };

        let up_sql = render(renderer, path, Direction::Up, up, data)?;
        if !contains_sql(&up_sql) {
            return Err(MigrateError::NoForwardSql { name: path.clone() });
        }

        let down_sql = if down.is_empty() {
            String::new()
        } else {
            render(renderer, path, Direction::Down, down, data)?
        };

        log::debug!("Loaded migration {} ({})", index + 1, path);
        steps.push(SqlStep::new(index as i32 + 1, path.as_str(), &up_sql, &down_sql));
    }

    Ok(steps)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
