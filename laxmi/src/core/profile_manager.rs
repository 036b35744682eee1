use crate::core::preferences::{JsonPreferencesStore, PreferencesStore};
use crate::core::session::{ProfileSession, SharedDatabase};
use crate::db::migrations::{MigrationReport, Migrator, SqlDirectory};
use crate::db::schema::Database;
use crate::db::schema_version::SchemaVersionStore;
use crate::utils::config::AppConfig;
use crate::utils::error::{LaxmiError, Result};
use crate::utils::paths::DataPaths;
use crate::utils::validation::validate_profile_name;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;

/// Creates, opens and deletes profiles under the root data directory.
pub struct ProfileManager {
    paths: DataPaths,
    preferences: Arc<dyn PreferencesStore>,
    migrator: Migrator,
}

impl ProfileManager {
    pub fn new(paths: DataPaths, preferences: Arc<dyn PreferencesStore>, migrator: Migrator) -> Self {
        Self {
            paths,
            preferences,
            migrator,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let paths = config.data_paths()?;
        let preferences = Arc::new(JsonPreferencesStore::new(paths.global_preferences_path()));
        let migrator = match &config.migrations_dir {
            Some(dir) => Migrator::new(SqlDirectory::new(dir.clone())),
            None => Migrator::builtin(),
        };

        Ok(Self::new(paths, preferences, migrator))
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn preferences(&self) -> &dyn PreferencesStore {
        self.preferences.as_ref()
    }

    pub fn migrator(&self) -> &Migrator {
        &self.migrator
    }

    /// Create the root data directory if this is a first run.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(self.paths.root()).await?;
        Ok(())
    }

    /// Names of all profile directories, sorted.
    pub async fn list_profiles(&self) -> Result<Vec<String>> {
        let mut profiles = Vec::new();

        let mut entries = fs::read_dir(self.paths.root()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                profiles.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        profiles.sort();
        Ok(profiles)
    }

    pub async fn create_profile(&self, profile_name: &str) -> Result<()> {
        let existing_profiles = self.list_profiles().await?;
        let validation = validate_profile_name(profile_name, existing_profiles.as_slice());
        if !validation.is_valid() {
            return Err(LaxmiError::InvalidProfileName {
                errors: validation.errors,
            });
        }

        let profile_dir = self.paths.profile_dir(profile_name);

        // The validator only sees directories; anything else in the way is a conflict too
        if fs::try_exists(&profile_dir).await? {
            return Err(already_exists(profile_name));
        }

        match fs::create_dir(&profile_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(already_exists(profile_name));
            }
            Err(e) => return Err(e.into()),
        }

        let preferences = serde_json::to_string_pretty(&serde_json::json!({}))?;
        fs::write(self.paths.profile_preferences_path(profile_name), preferences).await?;

        let report = self.initialize_profile_db(&self.paths.profile_db_path(profile_name))?;

        tracing::info!(
            "Created profile '{}' at schema version {}",
            profile_name,
            report.to_version
        );
        Ok(())
    }

    pub async fn delete_profile(&self, profile_name: &str, session: &mut ProfileSession) -> Result<()> {
        let profile_dir = self.existing_profile_dir(profile_name).await?;

        if session.is_active(profile_name) {
            session.close()?;
        }

        let prefs = self.preferences.load_preferences().await?;
        if prefs.last_opened_profile.as_deref() == Some(profile_name) {
            self.preferences.set_last_opened_profile(None).await?;
        }

        match fs::remove_dir_all(&profile_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Profile '{}' was already removed", profile_name);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Deleted profile '{}'", profile_name);
        Ok(())
    }

    /// Open a profile, upgrade its schema and make it the session's active profile.
    pub async fn open_profile(
        &self,
        profile_name: &str,
        session: &mut ProfileSession,
    ) -> Result<SharedDatabase> {
        self.existing_profile_dir(profile_name).await?;

        let db_path = self.paths.profile_db_path(profile_name);
        let is_new = !fs::try_exists(&db_path).await?;

        let mut db = Database::open(&db_path)?;
        if is_new {
            tracing::info!("Profile '{}' has no database yet, creating one", profile_name);
            SchemaVersionStore::initialize(db.get_connection())?;
        } else if !SchemaVersionStore::is_initialized(db.get_connection())? {
            tracing::warn!(
                "Database for profile '{}' has no schema version, initializing it",
                profile_name
            );
            SchemaVersionStore::initialize(db.get_connection())?;
        }

        let report = self.migrator.migrate(db.get_connection_mut())?;

        self.preferences.set_last_opened_profile(Some(profile_name)).await?;

        let shared: SharedDatabase = Arc::new(Mutex::new(db));
        if let Some(previous) = session.activate(profile_name, Arc::clone(&shared)) {
            tracing::debug!("Replaced active profile '{}'", previous.name);
        }

        tracing::info!(
            "Opened profile '{}' at schema version {}",
            profile_name,
            report.to_version
        );
        Ok(shared)
    }

    pub fn close_profile(&self, session: &mut ProfileSession) -> Result<bool> {
        session.close()
    }

    fn initialize_profile_db(&self, db_path: &Path) -> Result<MigrationReport> {
        let mut db = Database::open(db_path)?;
        SchemaVersionStore::initialize(db.get_connection())?;
        let report = self.migrator.migrate(db.get_connection_mut())?;
        db.close()?;
        Ok(report)
    }

    /// Directory of an existing profile.
    ///
    /// Names that could never have been created resolve to "does not exist"
    /// so they can't point outside the root.
    async fn existing_profile_dir(&self, profile_name: &str) -> Result<PathBuf> {
        let no_existing: &[&str] = &[];
        if !validate_profile_name(profile_name, no_existing).is_valid() {
            return Err(not_found(profile_name));
        }

        let profile_dir = self.paths.profile_dir(profile_name);
        match fs::metadata(&profile_dir).await {
            Ok(metadata) if metadata.is_dir() => Ok(profile_dir),
            Ok(_) => Err(not_found(profile_name)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(profile_name)),
            Err(e) => Err(e.into()),
        }
    }
}

fn already_exists(profile_name: &str) -> LaxmiError {
    LaxmiError::ProfileAlreadyExists {
        name: profile_name.to_string(),
    }
}

fn not_found(profile_name: &str) -> LaxmiError {
    LaxmiError::ProfileNotFound {
        name: profile_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::{Migration, StaticMigrations};
    use tempfile::TempDir;

    fn migrations(count: u32) -> StaticMigrations {
        StaticMigrations::new(
            (1..=count)
                .map(|v| Migration::sql(v, format!("create t{}", v), format!("CREATE TABLE t{} (id INTEGER);", v)))
                .collect(),
        )
    }

    fn manager(root: &TempDir, migration_count: u32) -> ProfileManager {
        let paths = DataPaths::new(root.path());
        let preferences = Arc::new(JsonPreferencesStore::new(paths.global_preferences_path()));
        ProfileManager::new(paths, preferences, Migrator::new(migrations(migration_count)))
    }

    fn stored_version(path: &Path) -> u32 {
        let db = Database::open(path).unwrap();
        SchemaVersionStore::current(db.get_connection()).unwrap()
    }

    #[tokio::test]
    async fn test_list_only_returns_directories() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("beta")).unwrap();
        std::fs::create_dir(root.path().join("Alpha")).unwrap();
        std::fs::write(root.path().join("global_preferences.json"), "{}").unwrap();

        let profiles = manager(&root, 0).list_profiles().await.unwrap();
        assert_eq!(profiles, vec!["Alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_ensure_root_creates_missing_directory() {
        let parent = TempDir::new().unwrap();
        let paths = DataPaths::new(parent.path().join("Laxmi-Dev"));
        let preferences = Arc::new(JsonPreferencesStore::new(paths.global_preferences_path()));
        let manager = ProfileManager::new(paths, preferences, Migrator::new(migrations(0)));

        manager.ensure_root().await.unwrap();
        assert!(manager.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_profile_layout() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 2);

        manager.create_profile("Ada2").await.unwrap();

        let prefs = std::fs::read_to_string(root.path().join("Ada2/preferences.json")).unwrap();
        assert_eq!(prefs, "{}");
        assert_eq!(stored_version(&root.path().join("Ada2/profile.db")), 2);
        assert_eq!(manager.list_profiles().await.unwrap(), vec!["Ada2"]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_name() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 1);

        let err = manager.create_profile("bad name!").await.unwrap_err();
        assert!(matches!(err, LaxmiError::InvalidProfileName { ref errors } if errors.len() == 1));
        assert!(manager.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 1);
        manager.create_profile("Ada2").await.unwrap();

        match manager.create_profile("Ada2").await {
            Err(LaxmiError::InvalidProfileName { errors }) => {
                assert_eq!(errors, vec!["Profile name must be unique.".to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_conflicts_with_non_directory_entry() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("Ada2"), "not a profile").unwrap();

        let err = manager(&root, 1).create_profile("Ada2").await.unwrap_err();
        assert!(matches!(err, LaxmiError::ProfileAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_profile() {
        let root = TempDir::new().unwrap();
        let mut session = ProfileSession::new();

        let err = manager(&root, 1)
            .delete_profile("Ghost", &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, LaxmiError::ProfileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_clears_last_opened() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 1);
        let mut session = ProfileSession::new();
        manager.create_profile("Ada2").await.unwrap();
        manager.open_profile("Ada2", &mut session).await.unwrap();

        manager.delete_profile("Ada2", &mut session).await.unwrap();

        assert!(!root.path().join("Ada2").exists());
        assert!(session.active_database().is_none());
        assert_eq!(manager.preferences().last_opened_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_other_profile_keeps_last_opened() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 1);
        let mut session = ProfileSession::new();
        manager.create_profile("Ada2").await.unwrap();
        manager.create_profile("Grace").await.unwrap();
        manager.open_profile("Ada2", &mut session).await.unwrap();

        manager.delete_profile("Grace", &mut session).await.unwrap();

        assert!(session.is_active("Ada2"));
        assert_eq!(
            manager.preferences().last_opened_profile().await.unwrap().as_deref(),
            Some("Ada2")
        );
        assert_eq!(manager.list_profiles().await.unwrap(), vec!["Ada2"]);
    }

    #[tokio::test]
    async fn test_open_missing_profile() {
        let root = TempDir::new().unwrap();
        let mut session = ProfileSession::new();

        let result = manager(&root, 1).open_profile("Ghost", &mut session).await;
        assert!(matches!(result, Err(LaxmiError::ProfileNotFound { .. })));
        assert!(session.active_database().is_none());
    }

    #[tokio::test]
    async fn test_open_rejects_path_like_names() {
        let root = TempDir::new().unwrap();
        let mut session = ProfileSession::new();

        let result = manager(&root, 1).open_profile("..", &mut session).await;
        assert!(matches!(result, Err(LaxmiError::ProfileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_recreates_missing_database() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("Ada2")).unwrap();
        let manager = manager(&root, 3);
        let mut session = ProfileSession::new();

        let db = manager.open_profile("Ada2", &mut session).await.unwrap();

        {
            let db = db.lock().unwrap();
            assert_eq!(SchemaVersionStore::current(db.get_connection()).unwrap(), 3);
        }
        assert!(root.path().join("Ada2/profile.db").exists());
        assert!(session.is_active("Ada2"));
        assert_eq!(
            manager.preferences().last_opened_profile().await.unwrap().as_deref(),
            Some("Ada2")
        );
    }

    #[tokio::test]
    async fn test_open_upgrades_older_profile() {
        let root = TempDir::new().unwrap();
        manager(&root, 1).create_profile("Ada2").await.unwrap();
        assert_eq!(stored_version(&root.path().join("Ada2/profile.db")), 1);

        let newer = manager(&root, 4);
        let mut session = ProfileSession::new();
        let db = newer.open_profile("Ada2", &mut session).await.unwrap();

        let db = db.lock().unwrap();
        assert_eq!(SchemaVersionStore::current(db.get_connection()).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_open_repairs_uninitialized_database() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("Ada2")).unwrap();
        // creation interrupted after the file was created
        Database::open(&root.path().join("Ada2/profile.db"))
            .unwrap()
            .close()
            .unwrap();

        let mut session = ProfileSession::new();
        manager(&root, 2).open_profile("Ada2", &mut session).await.unwrap();

        session.close().unwrap();
        assert_eq!(stored_version(&root.path().join("Ada2/profile.db")), 2);
    }

    #[tokio::test]
    async fn test_open_replaces_active_profile() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root, 1);
        manager.create_profile("Ada2").await.unwrap();
        manager.create_profile("Grace").await.unwrap();
        let mut session = ProfileSession::new();

        manager.open_profile("Ada2", &mut session).await.unwrap();
        manager.open_profile("Grace", &mut session).await.unwrap();

        assert!(session.is_active("Grace"));
        assert!(manager.close_profile(&mut session).unwrap());
        assert_eq!(
            manager.preferences().last_opened_profile().await.unwrap().as_deref(),
            Some("Grace")
        );
    }

    #[tokio::test]
    async fn test_failed_migration_keeps_session_and_preferences() {
        let root = TempDir::new().unwrap();
        manager(&root, 1).create_profile("Ada2").await.unwrap();

        let broken = {
            let paths = DataPaths::new(root.path());
            let preferences = Arc::new(JsonPreferencesStore::new(paths.global_preferences_path()));
            ProfileManager::new(
                paths,
                preferences,
                Migrator::new(StaticMigrations::new(vec![
                    Migration::sql(1, "create t1", "CREATE TABLE t1 (id INTEGER);"),
                    Migration::sql(2, "broken", "INSERT INTO nowhere VALUES (1);"),
                ])),
            )
        };
        let mut session = ProfileSession::new();

        let err = broken.open_profile("Ada2", &mut session).await.unwrap_err();
        assert!(matches!(err, LaxmiError::MigrationFailed { version: 2, .. }));
        assert!(session.active_database().is_none());
        assert_eq!(broken.preferences().last_opened_profile().await.unwrap(), None);
        assert_eq!(stored_version(&root.path().join("Ada2/profile.db")), 1);
    }
}
