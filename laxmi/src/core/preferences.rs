use crate::models::preferences::GlobalPreferences;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Storage for app-wide preferences (currently just the last opened profile)
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Load preferences, falling back to defaults when nothing is stored
    async fn load_preferences(&self) -> Result<GlobalPreferences>;

    /// Replace the stored preferences
    async fn save_preferences(&self, prefs: &GlobalPreferences) -> Result<()>;

    async fn last_opened_profile(&self) -> Result<Option<String>> {
        Ok(self.load_preferences().await?.last_opened_profile)
    }

    async fn set_last_opened_profile(&self, profile_name: Option<&str>) -> Result<()> {
        let prefs = GlobalPreferences {
            last_opened_profile: profile_name.map(str::to_string),
        };
        self.save_preferences(&prefs).await
    }

    async fn reset_preferences(&self) -> Result<()> {
        self.save_preferences(&GlobalPreferences::default()).await
    }
}

/// Preferences kept in a JSON file, fully rewritten on every save.
pub struct JsonPreferencesStore {
    path: PathBuf,
}

impl JsonPreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferencesStore for JsonPreferencesStore {
    async fn load_preferences(&self) -> Result<GlobalPreferences> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(GlobalPreferences::from_json_lenient(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(GlobalPreferences::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_preferences(&self, prefs: &GlobalPreferences) -> Result<()> {
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
