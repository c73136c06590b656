//! Jinja environment setup for Strata

use crate::error::JinjaResult;
use crate::functions::{
    make_env_fn, make_error_fn, make_from_json_fn, make_install_snapshot_fn, make_log_fn,
    make_to_json_fn, Data,
};
use minijinja::{Environment, UndefinedBehavior, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_core::sql_utils::{quote_ident, quote_literal};

/// Rendering capability handed to migration discovery and code packages.
///
/// `name` identifies the template in error messages; partials registered
/// with [`TemplateRenderer::add_partial`] are visible to every later render.
pub trait TemplateRenderer {
    /// Register a shared partial under `name`
    fn add_partial(&mut self, name: &str, source: &str) -> JinjaResult<()>;

    /// Render `source` with `data` as its top-level variables
    fn render(&self, name: &str, source: &str, data: &Data) -> JinjaResult<String>;

    /// Make `sql` the output of `install_snapshot(id)` in later renders
    fn add_snapshot(&mut self, id: &str, sql: &str) -> JinjaResult<()>;
}

/// Jinja templating environment for Strata
pub struct JinjaEnvironment {
    env: Environment<'static>,
    snapshots: BTreeMap<String, String>,
}

impl JinjaEnvironment {
    /// Create an environment with the Strata helper functions registered
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        env.add_function("env", make_env_fn());
        env.add_function("log", make_log_fn());
        env.add_function("error", make_error_fn());
        env.add_function("from_json", make_from_json_fn());
        env.add_function("to_json", make_to_json_fn());

        env.add_filter("to_json", make_to_json_fn());
        env.add_filter("quote_ident", |s: &str| quote_ident(s));
        env.add_filter("quote_literal", |s: &str| quote_literal(s));

        let mut this = Self {
            env,
            snapshots: BTreeMap::new(),
        };
        this.register_snapshots();
        this
    }

    fn register_snapshots(&mut self) {
        let snapshots = Arc::new(self.snapshots.clone());
        self.env
            .add_function("install_snapshot", make_install_snapshot_fn(snapshots));
    }

    /// Render a one-off template string with no data
    pub fn render_str(&self, source: &str) -> JinjaResult<String> {
        Ok(self.env.render_str(source, ())?)
    }

    /// Ids of the registered snapshots, sorted
    pub fn snapshot_ids(&self) -> Vec<String> {
        self.snapshots.keys().cloned().collect()
    }

    /// Names of the registered partials, sorted
    pub fn partial_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .env
            .templates()
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for JinjaEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for JinjaEnvironment {
    fn add_partial(&mut self, name: &str, source: &str) -> JinjaResult<()> {
        log::debug!("Registering partial {}", name);
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    fn render(&self, name: &str, source: &str, data: &Data) -> JinjaResult<String> {
        let ctx = Value::from_serialize(data);
        Ok(self.env.render_named_str(name, source, ctx)?)
    }

    fn add_snapshot(&mut self, id: &str, sql: &str) -> JinjaResult<()> {
        log::debug!("Registering snapshot {}", id);
        self.snapshots.insert(id.to_string(), sql.to_string());
        self.register_snapshots();
        Ok(())
    }
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;
