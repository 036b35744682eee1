use crate::utils::config::BuildMode;
use crate::utils::error::{LaxmiError, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "Laxmi";

const GLOBAL_PREFERENCES_FILE: &str = "global_preferences.json";
const PROFILE_PREFERENCES_FILE: &str = "preferences.json";
const PROFILE_DB_FILE: &str = "profile.db";

/// On-disk layout of the application data directory.
///
/// Resolution only; nothing here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform config directory plus `Laxmi` or `Laxmi-Dev`.
    pub fn resolve(mode: BuildMode) -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| {
            LaxmiError::InvalidConfig("Failed to get home directory".to_string())
        })?;

        Ok(Self::new(base_dirs.config_dir().join(app_folder_name(mode))))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn global_preferences_path(&self) -> PathBuf {
        self.root.join(GLOBAL_PREFERENCES_FILE)
    }

    pub fn profile_dir(&self, profile_name: &str) -> PathBuf {
        self.root.join(profile_name)
    }

    pub fn profile_preferences_path(&self, profile_name: &str) -> PathBuf {
        self.profile_dir(profile_name).join(PROFILE_PREFERENCES_FILE)
    }

    pub fn profile_db_path(&self, profile_name: &str) -> PathBuf {
        self.profile_dir(profile_name).join(PROFILE_DB_FILE)
    }
}

pub fn app_folder_name(mode: BuildMode) -> String {
    match mode {
        BuildMode::Release => APP_NAME.to_string(),
        BuildMode::Development => format!("{}-Dev", APP_NAME),
    }
}
