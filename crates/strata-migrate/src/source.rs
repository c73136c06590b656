//! Where migration and code package files come from.
//!
//! Discovery only needs to list a directory, read a file and walk the tree,
//! so it works the same over the OS filesystem and over files held in
//! memory (embedded in a binary or built by a test). Paths are relative to
//! the source root and use `/` as the separator; the root itself is `""`.

use crate::error::{MigrateError, MigrateResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only file tree
pub trait MigrationSource {
    /// Entries of the directory at `path`, sorted by name
    fn list_dir(&self, path: &str) -> MigrateResult<Vec<DirEntry>>;

    /// Contents of the file at `path`
    fn read_file(&self, path: &str) -> MigrateResult<String>;

    /// Every file below the root, depth first, sorted within each directory
    fn walk(&self) -> MigrateResult<Vec<String>> {
        let mut files = Vec::new();
        walk_into(self, "", &mut files)?;
        Ok(files)
    }
}

fn walk_into<S: MigrationSource + ?Sized>(
    source: &S,
    dir: &str,
    files: &mut Vec<String>,
) -> MigrateResult<()> {
    for entry in source.list_dir(dir)? {
        let path = join(dir, &entry.name);
        if entry.is_dir {
            walk_into(source, &path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Files under a directory on disk
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl MigrationSource for DirSource {
    fn list_dir(&self, path: &str) -> MigrateResult<Vec<DirEntry>> {
        let full = self.resolve(path);
        let io_err = |source| MigrateError::Source {
            path: full.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&full).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let is_dir = entry.file_type().map_err(io_err)?.is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> MigrateResult<String> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|source| MigrateError::Source {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Files held in memory, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for (path, contents) in iter {
            source.insert(path, contents);
        }
        source
    }
}

/// View of one directory of another source, with paths relative to it
pub struct SubSource<'a> {
    inner: &'a dyn MigrationSource,
    prefix: String,
}

impl<'a> SubSource<'a> {
    pub fn new(inner: &'a dyn MigrationSource, dir: &str) -> Self {
        Self {
            inner,
            prefix: dir.trim_matches('/').to_string(),
        }
    }

    fn full(&self, path: &str) -> String {
        match path.trim_matches('/') {
            "" => self.prefix.clone(),
            path => join(&self.prefix, path),
        }
    }
}

impl MigrationSource for SubSource<'_> {
    fn list_dir(&self, path: &str) -> MigrateResult<Vec<DirEntry>> {
        self.inner.list_dir(&self.full(path))
    }

    fn read_file(&self, path: &str) -> MigrateResult<String> {
        self.inner.read_file(&self.full(path))
    }
}

fn not_found(path: &str) -> MigrateError {
    MigrateError::Source {
        path: path.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
    }
}

impl MigrationSource for MemorySource {
    fn list_dir(&self, path: &str) -> MigrateResult<Vec<DirEntry>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };

        let mut dirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => {
                    files.insert(rest.to_string());
                }
            }
        }

        if !prefix.is_empty() && dirs.is_empty() && files.is_empty() {
            return Err(not_found(path));
        }

        let mut entries: Vec<DirEntry> = dirs
            .into_iter()
            .map(|name| DirEntry { name, is_dir: true })
            .chain(files.into_iter().map(|name| DirEntry {
                name,
                is_dir: false,
            }))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> MigrateResult<String> {
        self.files.get(path).cloned().ok_or_else(|| not_found(path))
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
