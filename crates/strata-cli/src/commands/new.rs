//! New command implementation - creates the next numbered migration

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strata_migrate::{find_migrations, DirSource, SPLIT_MARKER};

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::init::write_new_file;
use crate::context::RuntimeContext;

pub(crate) fn new_migration_text() -> String {
    format!(
        "-- Write your migrate up statements here\n\n{SPLIT_MARKER}\n\n\
         -- Write your migrate down statements here. If this migration is irreversible\n\
         -- then delete the separator line above.\n"
    )
}

/// Create `NNN_name.sql` after the last existing migration in `dir`
pub(crate) fn create_migration(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
        || name.starts_with('-')
    {
        anyhow::bail!(
            "Invalid migration name '{}': must not be empty, contain '/' or '\\', or start with '.' or '-'",
            name
        );
    }

    let existing = find_migrations(&DirSource::new(dir)).context("Error loading migrations")?;
    let path = dir.join(format!("{:03}_{}.sql", existing.len() + 1, name));
    write_new_file(&path, &new_migration_text())?;
    Ok(path)
}

/// Execute the new command
pub(crate) async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let path = create_migration(&ctx.migrations_path(), &args.name)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
