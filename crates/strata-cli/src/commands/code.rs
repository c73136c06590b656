//! Code package commands: install, compile and snapshot

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use strata_jinja::JinjaEnvironment;
use strata_migrate::{find_migrations, CodePackage, DirSource, SNAPSHOTS_DIR};

use crate::cli::{CodePathArgs, GlobalArgs};
use crate::commands::common::{
    publish_cancel_token, report, run_blocking, wait_with_interrupts, CancelSlot,
};
use crate::commands::init::write_new_file;
use crate::context::RuntimeContext;

/// The schema a package installs into is its directory name
pub(crate) fn package_schema(path: &Path) -> Result<String> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Code package not found: {}", path.display()))?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Cannot derive a schema name from {}", path.display()))
}

pub(crate) fn load_package(path: &Path) -> Result<CodePackage> {
    let schema = package_schema(path)?;
    CodePackage::load(&DirSource::new(path), schema).context("Failed to load code package")
}

/// Execute `code install`
pub(crate) async fn install(args: &CodePathArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let package = load_package(Path::new(&args.path))?;
    // The install is one transaction; interrupting cancels the statement in
    // flight and rolls everything back.
    let cancel = Arc::new(AtomicBool::new(false));
    let slot = Arc::new(CancelSlot::default());

    let work = {
        let slot = Arc::clone(&slot);
        run_blocking(move || {
            let mut renderer = JinjaEnvironment::new();
            let mut session = ctx.connect()?;
            publish_cancel_token(&slot, session.cancel_token());
            package
                .install(&mut session, &mut renderer, &ctx.data())
                .map_err(report)?;
            println!("Installed code package {}", package.schema());
            Ok(())
        })
    };
    wait_with_interrupts(work, &cancel, &slot).await
}

/// Execute `code compile`
pub(crate) async fn compile(args: &CodePathArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let package = load_package(Path::new(&args.path))?;
    let mut renderer = JinjaEnvironment::new();
    let sql = package
        .eval_all(&mut renderer, &ctx.data())
        .context("Failed to evaluate code package")?;
    print!("{sql}");
    Ok(())
}

/// Copy the directory tree at `from` to the new directory `to`
fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir(to).with_context(|| format!("Failed to create {}", to.display()))?;
    for entry in fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

/// Copy the package at `package_dir` into `<migrations_dir>/snapshots/NNN`
/// and add migration `NNN_install_<schema>.sql` that installs it, where
/// `NNN` is the next migration number. Returns the migration path.
pub(crate) fn snapshot_package(package_dir: &Path, migrations_dir: &Path) -> Result<PathBuf> {
    let package = load_package(package_dir)?;
    let existing =
        find_migrations(&DirSource::new(migrations_dir)).context("Error loading migrations")?;
    let id = format!("{:03}", existing.len() + 1);

    let snapshots = migrations_dir.join(SNAPSHOTS_DIR);
    fs::create_dir_all(&snapshots)
        .with_context(|| format!("Failed to create {}", snapshots.display()))?;
    let snapshot_dir = snapshots.join(&id);
    if snapshot_dir.exists() {
        anyhow::bail!("Snapshot directory {} already exists", snapshot_dir.display());
    }
    copy_dir(package_dir, &snapshot_dir)?;

    let path = migrations_dir.join(format!("{id}_install_{}.sql", package.schema()));
    write_new_file(&path, &format!("{{{{ install_snapshot(\"{id}\") }}}}\n"))?;
    log::debug!("Snapshotted {} into {}", package.schema(), snapshot_dir.display());
    Ok(path)
}

/// Execute `code snapshot`
pub(crate) async fn snapshot(args: &CodePathArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let path = snapshot_package(Path::new(&args.path), &ctx.migrations_path())?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
#[path = "code_test.rs"]
mod tests;
