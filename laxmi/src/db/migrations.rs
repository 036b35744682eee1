// Schema migrations: discovery, ordering and transactional application

use crate::db::registry;
use crate::db::schema_version::SchemaVersionStore;
use crate::utils::error::{LaxmiError, Result};
use rusqlite::{Connection, Transaction};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub type MigrationFn = fn(&Transaction<'_>) -> Result<()>;

/// What a migration does once its transaction is open.
#[derive(Clone)]
pub enum MigrationAction {
    /// Compiled-in transformation, free to read and rewrite data.
    Rust(MigrationFn),
    /// Batch of SQL statements.
    Sql(String),
}

/// A single versioned step in the profile schema history.
#[derive(Clone)]
pub struct Migration {
    version: u32,
    name: String,
    action: MigrationAction,
}

impl Migration {
    pub fn new(version: u32, name: impl Into<String>, up: MigrationFn) -> Self {
        Self {
            version,
            name: name.into(),
            action: MigrationAction::Rust(up),
        }
    }

    pub fn sql(version: u32, name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            action: MigrationAction::Sql(script.into()),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, tx: &Transaction<'_>) -> Result<()> {
        match &self.action {
            MigrationAction::Rust(up) => up(tx),
            MigrationAction::Sql(script) => {
                tx.execute_batch(script)?;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.action {
            MigrationAction::Rust(_) => "rust",
            MigrationAction::Sql(_) => "sql",
        };
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Somewhere migrations come from. Discovery runs fresh on every migrate.
pub trait MigrationSource: Send + Sync {
    /// Migrations sorted by ascending version, with unique positive versions.
    fn discover(&self) -> Result<Vec<Migration>>;
}

/// Migrations registered at compile time.
#[derive(Debug, Clone, Default)]
pub struct StaticMigrations {
    migrations: Vec<Migration>,
}

impl StaticMigrations {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl MigrationSource for StaticMigrations {
    fn discover(&self) -> Result<Vec<Migration>> {
        into_ordered(self.migrations.clone())
    }
}

/// A directory of `<version>-<description>.sql` scripts.
#[derive(Debug, Clone)]
pub struct SqlDirectory {
    dir: PathBuf,
}

impl SqlDirectory {
    pub const EXTENSION: &'static str = "sql";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MigrationSource for SqlDirectory {
    fn discover(&self) -> Result<Vec<Migration>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No migrations directory at {}", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut migrations = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type()?.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
                tracing::debug!("Skipping non-migration file {}", path.display());
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let version = parse_version(&file_name)?;

            let script = fs::read_to_string(&path)?;
            if script.trim().is_empty() {
                return Err(LaxmiError::MalformedMigrationContract {
                    name: file_name,
                    reason: "script is empty".to_string(),
                });
            }

            migrations.push(Migration::sql(version, file_name, script));
        }

        tracing::debug!(
            "Discovered {} migrations in {}",
            migrations.len(),
            self.dir.display()
        );
        into_ordered(migrations)
    }
}

/// Leading version of a `<version>-<description>` file name.
pub fn parse_version(file_name: &str) -> Result<u32> {
    let malformed = || LaxmiError::MalformedMigrationName {
        name: file_name.to_string(),
    };

    let digits_end = file_name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(file_name.len());
    if digits_end == 0 || !file_name[digits_end..].starts_with('-') {
        return Err(malformed());
    }

    file_name[..digits_end].parse().map_err(|_| malformed())
}

fn into_ordered(mut migrations: Vec<Migration>) -> Result<Vec<Migration>> {
    if let Some(zero) = migrations.iter().find(|m| m.version == 0) {
        return Err(LaxmiError::MalformedMigrationContract {
            name: zero.name.clone(),
            reason: "version must be a positive integer".to_string(),
        });
    }

    migrations.sort_by_key(|m| m.version);

    if let Some(pair) = migrations.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(LaxmiError::DuplicateMigrationVersion {
            version: pair[0].version,
            first: pair[0].name.clone(),
            second: pair[1].name.clone(),
        });
    }

    Ok(migrations)
}

/// Result of a [`Migrator::migrate`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<u32>,
}

pub struct Migrator {
    source: Box<dyn MigrationSource>,
}

impl Migrator {
    pub fn new(source: impl MigrationSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Migrator over the schema history compiled into the app.
    pub fn builtin() -> Self {
        Self::new(registry::builtin())
    }

    pub fn discover(&self) -> Result<Vec<Migration>> {
        self.source.discover()
    }

    pub fn latest_version(&self) -> Result<u32> {
        Ok(self.discover()?.last().map(|m| m.version).unwrap_or(0))
    }

    /// Bring `conn` up to the latest known version.
    ///
    /// The version store must already be initialized. Each pending migration
    /// runs in its own transaction; the first failure stops the run and leaves
    /// the database at the last committed version.
    pub fn migrate(&self, conn: &mut Connection) -> Result<MigrationReport> {
        let migrations = self.discover()?;
        let from_version = SchemaVersionStore::current(conn)?;

        let mut report = MigrationReport {
            from_version,
            to_version: from_version,
            applied: Vec::new(),
        };

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > from_version)
            .collect();
        if pending.is_empty() {
            tracing::debug!("Schema is up to date at version {}", from_version);
            return Ok(report);
        }

        tracing::info!(
            "Migrating schema from version {} ({} pending)",
            from_version,
            pending.len()
        );

        for migration in pending {
            let tx = conn.transaction()?;
            apply_migration(tx, migration)?;

            tracing::info!("Applied migration {} ({})", migration.version, migration.name);
            report.applied.push(migration.version);
            report.to_version = migration.version;
        }

        Ok(report)
    }
}

/// Run `migration` and record its version inside `tx`, then commit.
///
/// On failure `tx` is dropped, which rolls back everything the migration wrote.
pub fn apply_migration(tx: Transaction<'_>, migration: &Migration) -> Result<()> {
    run_and_commit(tx, migration).map_err(|source| {
        tracing::warn!(
            "Migration {} ({}) failed, rolled back: {}",
            migration.version,
            migration.name,
            source
        );
        LaxmiError::MigrationFailed {
            version: migration.version,
            name: migration.name.clone(),
            source: Box::new(source),
        }
    })
}

fn run_and_commit(tx: Transaction<'_>, migration: &Migration) -> Result<()> {
    migration.run(&tx)?;
    SchemaVersionStore::set(&tx, migration.version)?;
    tx.commit()?;
    Ok(())
}
