//! Status command implementation

use anyhow::{Context, Result};
use strata_jinja::JinjaEnvironment;
use strata_migrate::{DirSource, MigrationStatus, Migrator};

use crate::cli::GlobalArgs;
use crate::commands::common::{report, run_blocking};
use crate::context::RuntimeContext;

/// Execute the status command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let (status, ctx) = run_blocking(move || {
        let status = read_status(&ctx)?;
        Ok((status, ctx))
    })
    .await?;

    println!("{}", format_status(&status, &ctx));
    Ok(())
}

fn read_status(ctx: &RuntimeContext) -> Result<MigrationStatus> {
    let source = DirSource::new(ctx.migrations_path());
    let mut renderer = JinjaEnvironment::new();
    let mut migrator = Migrator::new(ctx.migrator_options());
    migrator
        .load_migrations(&source, &mut renderer, &ctx.data())
        .context("Error loading migrations")?;

    let mut session = ctx.connect()?;
    migrator.status(&mut session).map_err(report)
}

pub(crate) fn format_status(status: &MigrationStatus, ctx: &RuntimeContext) -> String {
    let summary = if status.is_up_to_date() {
        "up to date".to_string()
    } else {
        format!("{} migration(s) pending", status.pending())
    };
    let db = &ctx.config.database;
    format!(
        "status:   {}\nversion:  {} of {}\nhost:     {}\ndatabase: {}",
        summary,
        status.current_version,
        status.last_version,
        db.host.as_deref().unwrap_or("-"),
        db.database.as_deref().unwrap_or("-"),
    )
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
