//! strata-migrate - Migration engine for Strata
//!
//! Discovers numbered migration files from a [`MigrationSource`], renders
//! them through a [`TemplateRenderer`](strata_jinja::TemplateRenderer), and
//! moves a database between versions one step at a time under the advisory
//! lock. Code packages reuse the same rendering and locking to install a
//! schema wholesale, or are snapshotted into a migration.

pub mod code;
pub mod discovery;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod source;
pub mod version;

pub use code::CodePackage;
pub use discovery::{
    find_migrations, load_migrations, DISABLE_TX_MARKER, SNAPSHOTS_DIR, SPLIT_MARKER,
};
pub use error::{MigrateError, MigrateResult};
pub use migration::{Direction, FuncStep, MigrationStep, SqlStep, StepContext};
pub use migrator::{MigrationStatus, Migrator, MigratorOptions};
pub use source::{DirEntry, DirSource, MemorySource, MigrationSource, SubSource};
pub use version::VersionTable;
