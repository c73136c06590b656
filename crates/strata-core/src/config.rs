//! Configuration types and parsing for strata.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::{
    default_application_name, default_migrations_path, default_version_table,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File names probed, in order, when no config path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["strata.yml", "strata.yaml"];

/// Main configuration from strata.yml
///
/// Built once per invocation (file, then CLI overrides) and handed to the
/// migrator by reference afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directory containing the numbered migration files
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Run every migration outside of a transaction
    #[serde(default)]
    pub disable_tx: bool,

    /// Values available to migration templates
    #[serde(default)]
    pub data: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations_path: default_migrations_path(),
            disable_tx: false,
            data: BTreeMap::new(),
        }
    }
}

/// SSL negotiation mode passed to the PostgreSQL driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Never use TLS
    Disable,
    /// Use TLS when the server offers it
    Prefer,
    /// Fail unless TLS is negotiated
    Require,
}

impl SslMode {
    /// The libpq keyword for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(CoreError::ConfigInvalid {
                message: format!(
                    "sslmode '{other}' is invalid (expected disable, prefer or require)"
                ),
            }),
        }
    }
}

/// Database connection configuration
///
/// When `conn_string` is set it supplies the host and port; the individual
/// `user`, `password`, `database` and `sslmode` fields still override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// libpq connection string (URL or key=value form)
    #[serde(default)]
    pub conn_string: Option<String>,

    /// Network host or Unix socket directory
    #[serde(default)]
    pub host: Option<String>,

    /// Server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name
    #[serde(default)]
    pub database: Option<String>,

    /// Role to connect as
    #[serde(default)]
    pub user: Option<String>,

    /// Password for `user`
    #[serde(default)]
    pub password: Option<String>,

    /// SSL mode
    #[serde(default)]
    pub sslmode: Option<SslMode>,

    /// `application_name` reported to the server
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Name of the single-row version table, ideally schema qualified
    #[serde(default = "default_version_table")]
    pub version_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            conn_string: None,
            host: None,
            port: None,
            database: None,
            user: None,
            password: None,
            sslmode: None,
            application_name: default_application_name(),
            version_table: default_version_table(),
        }
    }
}

impl DatabaseConfig {
    /// Render the connection settings as a `postgres://` URL.
    ///
    /// Returns `conn_string` verbatim when one is configured.
    pub fn display_url(&self) -> String {
        if let Some(conn_string) = &self.conn_string {
            return conn_string.clone();
        }

        let mut url = String::from("postgres://");
        if let Some(user) = &self.user {
            url.push_str(user);
            if let Some(password) = &self.password {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }
        url.push_str(self.host.as_deref().unwrap_or(""));
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        url.push('/');
        url.push_str(self.database.as_deref().unwrap_or(""));
        if let Some(sslmode) = self.sslmode {
            url.push_str("?sslmode=");
            url.push_str(sslmode.as_str());
        }
        url
    }
}

impl Config {
    /// Parse configuration from YAML text. `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> CoreResult<Self> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        Ok(config)
    }

    /// Load configuration from a file path without template expansion
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Loading config from {}", path.display());
        Self::parse(&content, &path.display().to_string())
    }

    /// Find the default config file in `dir`, if any
    pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    /// Check the settings needed to open a database connection
    pub fn validate(&self) -> CoreResult<()> {
        let db = &self.database;
        if db.conn_string.is_none() {
            if db.host.as_deref().map_or(true, str::is_empty) {
                return Err(CoreError::ConfigInvalid {
                    message: "config must contain database.host or database.conn_string"
                        .to_string(),
                });
            }
            if db.database.as_deref().map_or(true, str::is_empty) {
                return Err(CoreError::ConfigInvalid {
                    message: "config must contain database.database or database.conn_string"
                        .to_string(),
                });
            }
        }

        if db.version_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.version_table cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
