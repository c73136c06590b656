//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strata_core::config::DEFAULT_CONFIG_FILES;
use strata_core::Config;
use strata_db::PostgresSession;
use strata_jinja::{data_from_yaml, Data, JinjaEnvironment};
use strata_migrate::MigratorOptions;

use crate::cli::GlobalArgs;

/// Resolved configuration shared by the commands
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Config file merged with command line overrides
    pub config: Config,

    /// File the config was read from, if any
    pub config_path: Option<PathBuf>,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Load the config file from the current directory and apply overrides
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::load_from(args, &cwd)
    }

    /// Load relative to `dir` instead of the current directory
    pub fn load_from(args: &GlobalArgs, dir: &Path) -> Result<Self> {
        let config_path = resolve_config_path(args.config.as_deref(), dir)?;
        let mut config = match &config_path {
            Some(path) => load_config(path)?,
            None => {
                log::debug!(
                    "No {} found in {}, using defaults",
                    DEFAULT_CONFIG_FILES.join(" or "),
                    dir.display()
                );
                Config::default()
            }
        };
        apply_overrides(&mut config, args);

        Ok(Self {
            config,
            config_path,
            verbose: args.verbose,
        })
    }

    /// Template data from the config's `data` section
    pub fn data(&self) -> Data {
        data_from_yaml(&self.config.data)
    }

    pub fn migrations_path(&self) -> PathBuf {
        PathBuf::from(&self.config.migrations_path)
    }

    pub fn migrator_options(&self) -> MigratorOptions {
        MigratorOptions {
            disable_tx: self.config.disable_tx,
            version_table: self.config.database.version_table.clone(),
        }
    }

    /// Validate the connection settings and connect.
    ///
    /// Blocks; call from a plain thread, never from the async runtime.
    pub fn connect(&self) -> Result<PostgresSession> {
        self.config.validate().context("Invalid config")?;
        PostgresSession::connect(&self.config.database).context("Unable to connect to PostgreSQL")
    }
}

/// Pick the config file: an explicit path must exist, otherwise the first
/// default file name present in `dir` is used.
pub(crate) fn resolve_config_path(explicit: Option<&str>, dir: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = dir.join(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(Some(path))
        }
        None => Ok(Config::find_in_dir(dir)),
    }
}

/// Read a config file, render it as a template, then parse the YAML
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let rendered = JinjaEnvironment::new()
        .render_str(&content)
        .with_context(|| format!("Failed to render config file: {}", path.display()))?;
    let config = Config::parse(&rendered, &path.display().to_string())?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

pub(crate) fn apply_overrides(config: &mut Config, args: &GlobalArgs) {
    let db = &mut config.database;
    if let Some(v) = &args.conn_string {
        db.conn_string = Some(v.clone());
    }
    if let Some(v) = &args.host {
        db.host = Some(v.clone());
    }
    if let Some(v) = args.port {
        db.port = Some(v);
    }
    if let Some(v) = &args.user {
        db.user = Some(v.clone());
    }
    if let Some(v) = &args.password {
        db.password = Some(v.clone());
    }
    if let Some(v) = &args.database {
        db.database = Some(v.clone());
    }
    if let Some(v) = args.sslmode {
        db.sslmode = Some(v);
    }
    if let Some(v) = &args.version_table {
        db.version_table = v.clone();
    }
    if let Some(v) = &args.migrations {
        config.migrations_path = v.clone();
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
