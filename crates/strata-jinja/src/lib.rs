//! strata-jinja - Template rendering for Strata
//!
//! Migration bodies, code package files and the config file itself are
//! rendered through a minijinja environment with strict undefined handling.
//! Shared partials are registered by their path relative to the migrations
//! root and pulled in with `{% include "shared/file.sql" %}`.
//!
//! Helpers available in every template: `env()`, `from_json()`,
//! `to_json()`, `error()` and `log()`, plus the `quote_ident`,
//! `quote_literal` and `to_json` filters.

pub mod environment;
pub mod error;
pub mod functions;

pub use environment::{JinjaEnvironment, TemplateRenderer};
pub use error::{JinjaError, JinjaResult};
pub use functions::{data_from_yaml, Data};
