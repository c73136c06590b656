//! strata-core - Core library for Strata
//!
//! This crate provides configuration parsing, migration destination parsing
//! and SQL quoting helpers shared by the other Strata crates.

pub mod config;
pub mod destination;
pub mod error;
pub(crate) mod serde_helpers;
pub mod sql_utils;

pub use config::{Config, DatabaseConfig, SslMode};
pub use destination::Destination;
pub use error::{CoreError, CoreResult};
