use crate::utils::error::{LaxmiError, Result};
use crate::utils::paths::DataPaths;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "LAXMI_DATA_DIR";
pub const MIGRATIONS_DIR_ENV: &str = "LAXMI_MIGRATIONS_DIR";
pub const DEV_MODE_ENV: &str = "LAXMI_DEV";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Release,
    Development,
}

impl BuildMode {
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Release
        }
    }
}

/// Startup configuration for the profile store.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: BuildMode,
    pub data_dir: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::current(),
            data_dir: None,
            migrations_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(DEV_MODE_ENV) {
            config.mode = match value.trim() {
                "1" | "true" => BuildMode::Development,
                "0" | "false" => BuildMode::Release,
                other => {
                    return Err(LaxmiError::InvalidConfig(format!(
                        "{} must be 0 or 1, got '{}'",
                        DEV_MODE_ENV, other
                    )))
                }
            };
        }

        config.data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        config.migrations_dir = lookup(MIGRATIONS_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn data_paths(&self) -> Result<DataPaths> {
        match &self.data_dir {
            Some(dir) => Ok(DataPaths::new(dir.clone())),
            None => DataPaths::resolve(self.mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.mode, BuildMode::current());
        assert!(config.data_dir.is_none());
        assert!(config.migrations_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DEV_MODE_ENV, "0"),
            (DATA_DIR_ENV, "/tmp/laxmi"),
            (MIGRATIONS_DIR_ENV, "/tmp/migrations"),
        ]))
        .unwrap();

        assert_eq!(config.mode, BuildMode::Release);
        assert_eq!(config.data_paths().unwrap(), DataPaths::new("/tmp/laxmi"));
        assert_eq!(config.migrations_dir, Some(PathBuf::from("/tmp/migrations")));
    }

    #[test]
    fn test_rejects_bad_dev_flag() {
        let result = AppConfig::from_lookup(lookup_from(&[(DEV_MODE_ENV, "maybe")]));
        assert!(matches!(result, Err(LaxmiError::InvalidConfig(_))));
    }
}
