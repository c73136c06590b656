//! Code packages.
//!
//! A code package is a directory of `.sql` templates plus a `manifest.conf`
//! listing the files to install, in order. Installing drops and recreates
//! the package schema and runs every manifest file inside one transaction
//! under the migration advisory lock. Packages carry no version; each
//! install replaces the previous one.

use crate::error::{MigrateError, MigrateResult};
use crate::source::MigrationSource;
use std::collections::BTreeMap;
use strata_core::sql_utils::quote_ident;
use strata_db::{AdvisoryLock, Session, Transaction};
use strata_jinja::{Data, TemplateRenderer};

/// Manifest file name at the package root
pub const MANIFEST_FILE: &str = "manifest.conf";

/// A loaded code package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePackage {
    schema: String,
    manifest: Vec<String>,
    files: BTreeMap<String, String>,
}

fn parse_manifest(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

impl CodePackage {
    /// Read the manifest and every `.sql` file of `source`. The package
    /// installs into `schema`, usually the package directory's name.
    pub fn load(source: &dyn MigrationSource, schema: impl Into<String>) -> MigrateResult<Self> {
        let schema = schema.into();
        if schema.trim().is_empty() {
            return Err(MigrateError::CodePackage(
                "code package schema name cannot be empty".to_string(),
            ));
        }

        let manifest = parse_manifest(&source.read_file(MANIFEST_FILE)?);
        if manifest.is_empty() {
            return Err(MigrateError::CodePackage(format!(
                "{MANIFEST_FILE} lists no files"
            )));
        }

        let mut files = BTreeMap::new();
        for path in source.walk()? {
            if path.ends_with(".sql") {
                let body = source.read_file(&path)?;
                files.insert(path, body);
            }
        }

        if let Some(missing) = manifest.iter().find(|f| !files.contains_key(f.as_str())) {
            return Err(MigrateError::CodePackage(format!(
                "{MANIFEST_FILE} lists {missing}, which is not a .sql file in the package"
            )));
        }

        log::debug!(
            "Loaded code package {} ({} files, {} in manifest)",
            schema,
            files.len(),
            manifest.len()
        );
        Ok(Self {
            schema,
            manifest,
            files,
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Files to install, in order
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Make every package file available to `{% include %}`
    fn register(&self, renderer: &mut dyn TemplateRenderer) -> MigrateResult<()> {
        for (path, body) in &self.files {
            renderer
                .add_partial(path, body)
                .map_err(|source| MigrateError::Template {
                    file: path.clone(),
                    direction: "partial".to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Render one package file. Other package files must already be
    /// registered with `renderer` if the file includes them.
    pub fn eval_file(
        &self,
        renderer: &dyn TemplateRenderer,
        file: &str,
        data: &Data,
    ) -> MigrateResult<String> {
        let body = self.files.get(file).ok_or_else(|| {
            MigrateError::CodePackage(format!("cannot find template {file}"))
        })?;
        renderer
            .render(file, body, data)
            .map_err(|source| MigrateError::Template {
                file: file.to_string(),
                direction: "code".to_string(),
                source,
            })
    }

    fn render_manifest(
        &self,
        renderer: &mut dyn TemplateRenderer,
        data: &Data,
    ) -> MigrateResult<Vec<(&str, String)>> {
        self.register(renderer)?;
        let mut rendered = Vec::with_capacity(self.manifest.len());
        for file in &self.manifest {
            rendered.push((file.as_str(), self.eval_file(renderer, file, data)?));
        }
        Ok(rendered)
    }

    /// Render the whole manifest as one script, each file preceded by a
    /// `-- <file>` header
    pub fn eval_all(
        &self,
        renderer: &mut dyn TemplateRenderer,
        data: &Data,
    ) -> MigrateResult<String> {
        let mut script = String::new();
        for (file, sql) in self.render_manifest(renderer, data)? {
            script.push_str(&format!("-- {file}\n\n"));
            script.push_str(&sql);
        }
        Ok(script)
    }

    /// Replace the package schema with a fresh install.
    ///
    /// Every file is rendered before the database is touched. A failing file
    /// rolls back the whole install and leaves the previous schema in place.
    pub fn install(
        &self,
        session: &mut dyn Session,
        renderer: &mut dyn TemplateRenderer,
        data: &Data,
    ) -> MigrateResult<()> {
        let rendered = self.render_manifest(renderer, data)?;

        let mut lock = AdvisoryLock::acquire(session)?;
        let result = self.install_locked(&mut *lock, &rendered);
        let reset = lock.reset_session();
        let released = lock.release();
        if result.is_err() {
            if let Err(e) = &reset {
                log::warn!("Failed to reset session after code install: {}", e);
            }
            if let Err(e) = &released {
                log::warn!("Failed to release advisory lock: {}", e);
            }
        }
        result?;
        reset?;
        released?;
        log::info!("Installed code package {}", self.schema);
        Ok(())
    }

    fn install_locked(
        &self,
        session: &mut dyn Session,
        rendered: &[(&str, String)],
    ) -> MigrateResult<()> {
        let schema = quote_ident(&self.schema);
        let mut tx = Transaction::begin(session)?;
        tx.execute_batch(&format!("drop schema if exists {schema} cascade"))?;
        tx.execute_batch(&format!("create schema {schema}"))?;
        tx.prepend_search_path(&self.schema)?;

        for (file, sql) in rendered {
            log::debug!("Installing {}", file);
            tx.execute_batch(sql)
                .map_err(|source| MigrateError::CodeInstall {
                    file: file.to_string(),
                    statement: sql.clone(),
                    source,
                })?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "code_test.rs"]
mod tests;
