//! Init command implementation - writes a starter config and migration

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use strata_core::config::DEFAULT_CONFIG_FILES;

use crate::cli::InitArgs;

pub(crate) const DEFAULT_CONFIG: &str = r#"# Strata configuration. This file is rendered as a template before it is
# parsed, so values may come from the environment:
#   password: '{{ env("PGPASSWORD", "") }}'
database:
  # host is required (network host or path to Unix domain socket)
  # host: localhost
  # port: 5432
  # database is required
  # database: app
  # user defaults to the OS user
  # user: app
  # password: secret
  # sslmode: prefer          # disable, prefer or require
  # conn_string: postgres://app@localhost/app
  version_table: public.schema_version

migrations_path: .

# Any values in the data section are available in migration templates
data: {}
#  prefix: foo
"#;

pub(crate) const SAMPLE_MIGRATION: &str = "-- This is a sample migration.

create table people(
  id serial primary key,
  first_name varchar not null,
  last_name varchar not null
);

---- create above / drop below ----

drop table people;
";

pub(crate) const SAMPLE_MIGRATION_FILE: &str = "001_create_people.sql.example";

/// Write `content` to a new file, refusing to overwrite
pub(crate) fn write_new_file(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub(crate) fn init_dir(directory: &Path, create: bool) -> Result<()> {
    if create {
        fs::create_dir(directory)
            .with_context(|| format!("Failed to create directory: {}", directory.display()))?;
    }
    write_new_file(&directory.join(DEFAULT_CONFIG_FILES[0]), DEFAULT_CONFIG)?;
    write_new_file(&directory.join(SAMPLE_MIGRATION_FILE), SAMPLE_MIGRATION)?;
    Ok(())
}

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs) -> Result<()> {
    let (directory, create) = match &args.directory {
        Some(dir) => (Path::new(dir), true),
        None => (Path::new("."), false),
    };
    init_dir(directory, create)?;

    println!("  Created {}", directory.join(DEFAULT_CONFIG_FILES[0]).display());
    println!("  Created {}", directory.join(SAMPLE_MIGRATION_FILE).display());
    println!();
    println!("Next steps:");
    println!("  edit {} with your database settings", DEFAULT_CONFIG_FILES[0]);
    println!("  strata new create_first_table");
    println!("  strata migrate");
    Ok(())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
