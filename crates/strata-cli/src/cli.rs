//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use strata_core::{Destination, SslMode};

/// Strata - templated PostgreSQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands.
///
/// Connection flags override the matching `database.*` settings of the
/// config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: ./strata.yml or ./strata.yaml)
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<String>,

    /// Migrations directory
    #[arg(short, long, global = true, env = "STRATA_MIGRATIONS")]
    pub migrations: Option<String>,

    /// libpq connection string (URL or key=value form)
    #[arg(long, global = true, env = "STRATA_CONN_STRING", hide_env_values = true)]
    pub conn_string: Option<String>,

    /// Database host or Unix socket directory
    #[arg(long, global = true, env = "STRATA_HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(long, global = true, env = "STRATA_PORT")]
    pub port: Option<u16>,

    /// Database user
    #[arg(long, global = true, env = "STRATA_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, global = true, env = "STRATA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(long, global = true, env = "STRATA_DATABASE")]
    pub database: Option<String>,

    /// SSL mode: disable, prefer or require
    #[arg(long, global = true, env = "STRATA_SSLMODE")]
    pub sslmode: Option<SslMode>,

    /// Version table name
    #[arg(long, global = true, env = "STRATA_VERSION_TABLE")]
    pub version_table: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter strata.yml and sample migration
    Init(InitArgs),

    /// Create the next numbered migration file
    New(NewArgs),

    /// Migrate the database to a destination version
    Migrate(MigrateArgs),

    /// Show the current and latest migration versions
    Status,

    /// Manage code packages
    Code(CodeArgs),

    /// Renumber migrations merged in from another branch
    Renumber(RenumberArgs),

    /// Print the connection string built from the configuration
    PrintConnstring,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create (default: current directory)
    pub directory: Option<String>,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Migration name, e.g. create_users
    pub name: String,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Destination: last, N, +N, -N or -+N (redo the last N)
    #[arg(short, long, default_value = "last", allow_hyphen_values = true)]
    pub destination: Destination,
}

/// Arguments for the code command
#[derive(Args, Debug)]
pub struct CodeArgs {
    #[command(subcommand)]
    pub command: CodeCommands,
}

/// Code package subcommands
#[derive(Subcommand, Debug)]
pub enum CodeCommands {
    /// Replace the package schema with a fresh install
    Install(CodePathArgs),

    /// Print the rendered package SQL without touching the database
    Compile(CodePathArgs),

    /// Freeze the package into the migrations as a new install migration
    Snapshot(CodePathArgs),
}

/// Code package location
#[derive(Args, Debug)]
pub struct CodePathArgs {
    /// Package directory; its name is the schema installed into
    pub path: String,
}

/// Arguments for the renumber command
#[derive(Args, Debug)]
pub struct RenumberArgs {
    #[command(subcommand)]
    pub command: RenumberCommands,
}

/// Renumber steps, run on either side of a merge
#[derive(Subcommand, Debug)]
pub enum RenumberCommands {
    /// Record the migrations present before the merge
    Start,

    /// Move migrations added since `start` after the recorded ones
    Finish,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
