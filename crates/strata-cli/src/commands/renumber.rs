//! Renumber command - moves migrations merged in from another branch after
//! the ones that were already there.
//!
//! `renumber start` records the migration files present before a merge;
//! `renumber finish` renames every file added since then to follow the last
//! recorded number.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::cli::{GlobalArgs, RenumberArgs, RenumberCommands};
use crate::context::RuntimeContext;

/// Records the pre-merge file list inside the migrations directory
pub(crate) const RENUMBER_FILE: &str = ".strata-renumber.tmp";

static MIGRATION_NAME_RE: OnceLock<Regex> = OnceLock::new();

/// Sequence prefix and the rest of a migration file name
fn split_name(name: &str) -> Option<(u64, &str)> {
    let re = MIGRATION_NAME_RE
        .get_or_init(|| Regex::new(r"\A(\d+)(_.+\.sql)\z").expect("valid regex"));
    let captures = re.captures(name)?;
    let sequence = captures.get(1)?.as_str().parse().ok()?;
    Some((sequence, captures.get(2)?.as_str()))
}

/// Migration file names in `dir` ordered by sequence. Unlike migration
/// discovery, duplicate and missing numbers are allowed here.
fn list_migration_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some((sequence, _)) = split_name(&name) {
            files.push((sequence, name));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, name)| name).collect())
}

/// Record the current migrations of `dir`
pub(crate) fn renumber_start(dir: &Path) -> Result<usize> {
    let files = list_migration_files(dir)?;
    let path = dir.join(RENUMBER_FILE);
    let mut content = files.join("\n");
    content.push('\n');
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(files.len())
}

/// Rename migrations added since [`renumber_start`] to follow the recorded
/// ones, in sequence order. Returns the `(old, new)` names.
pub(crate) fn renumber_finish(dir: &Path) -> Result<Vec<(String, String)>> {
    let path = dir.join(RENUMBER_FILE);
    let recorded = fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read {}; run `strata renumber start` before merging",
            path.display()
        )
    })?;
    let recorded: HashSet<&str> = recorded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut last = recorded
        .iter()
        .filter_map(|name| split_name(name).map(|(sequence, _)| sequence))
        .max()
        .unwrap_or(0);

    let mut renames = Vec::new();
    for name in list_migration_files(dir)? {
        if recorded.contains(name.as_str()) {
            continue;
        }
        let Some((_, rest)) = split_name(&name) else {
            continue;
        };
        last += 1;
        let renamed = format!("{last:03}{rest}");
        if renamed != name {
            let target = dir.join(&renamed);
            if target.exists() {
                anyhow::bail!("Cannot rename {} to {}: file exists", name, renamed);
            }
            fs::rename(dir.join(&name), &target)
                .with_context(|| format!("Failed to rename {name} to {renamed}"))?;
            log::debug!("Renamed {} to {}", name, renamed);
        }
        renames.push((name, renamed));
    }

    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(renames)
}

/// Execute the renumber command
pub(crate) async fn execute(args: &RenumberArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let dir = ctx.migrations_path();
    match args.command {
        RenumberCommands::Start => {
            let count = renumber_start(&dir)?;
            println!("Recorded {count} migrations; merge, then run `strata renumber finish`");
        }
        RenumberCommands::Finish => {
            let renames = renumber_finish(&dir)?;
            for (old, new) in &renames {
                if old != new {
                    println!("Renamed {old} to {new}");
                }
            }
            if renames.iter().all(|(old, new)| old == new) {
                println!("Nothing to renumber");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "renumber_test.rs"]
mod tests;
