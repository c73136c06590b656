//! Migrate command implementation

use anyhow::{Context, Result};
use chrono::Local;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use strata_core::Destination;
use strata_jinja::JinjaEnvironment;
use strata_migrate::{DirSource, Migrator};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{
    publish_cancel_token, report, run_blocking, wait_with_interrupts, CancelSlot,
};
use crate::context::RuntimeContext;

/// Execute the migrate command
pub(crate) async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let destination = args.destination;
    let cancel = Arc::new(AtomicBool::new(false));
    let slot = Arc::new(CancelSlot::default());

    let work = {
        let cancel = Arc::clone(&cancel);
        let slot = Arc::clone(&slot);
        run_blocking(move || run_migrations(&ctx, destination, cancel, &slot))
    };
    wait_with_interrupts(work, &cancel, &slot).await
}

fn run_migrations(
    ctx: &RuntimeContext,
    destination: Destination,
    cancel: Arc<AtomicBool>,
    slot: &CancelSlot,
) -> Result<()> {
    let source = DirSource::new(ctx.migrations_path());
    let mut renderer = JinjaEnvironment::new();
    let mut migrator = Migrator::new(ctx.migrator_options()).with_cancel_handle(cancel);
    migrator
        .load_migrations(&source, &mut renderer, &ctx.data())
        .context("Error loading migrations")?;

    migrator.on_start(|_sequence, name, direction, sql| {
        println!(
            "{} executing {} {}\n{}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            name,
            direction,
            sql
        );
    });

    let mut session = ctx.connect()?;
    publish_cancel_token(slot, session.cancel_token());

    let status = migrator.status(&mut session).map_err(report)?;
    let targets = destination.targets(status.current_version, status.last_version);
    log::debug!(
        "Destination {} from version {} resolves to {:?}",
        destination,
        status.current_version,
        targets
    );

    for target in targets {
        migrator.migrate_to(&mut session, target).map_err(report)?;
    }
    Ok(())
}
