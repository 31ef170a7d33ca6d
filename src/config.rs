//! Configuration loading and management
//!
//! Handles parsing of `taskmate.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "taskmate.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage slot configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Category color configuration
    #[serde(default)]
    pub categories: CategoriesConfig,
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slot key holding the task collection
    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,

    /// Slot key holding the category collection
    #[serde(default = "default_categories_key")]
    pub categories_key: String,

    /// How long a lifecycle operation waits for the slot lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_tasks_key() -> String {
    "TASKMATE_TASKS".to_string()
}

fn default_categories_key() -> String {
    "TASKMATE_CATEGORIES".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_key: default_tasks_key(),
            categories_key: default_categories_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Category color configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesConfig {
    /// Rotation palette for categories added without a color
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    /// Color reported for keys with no category definition
    #[serde(default = "default_fallback_color")]
    pub fallback_color: String,
}

fn default_palette() -> Vec<String> {
    crate::category::COLOR_PALETTE
        .iter()
        .map(|color| color.to_string())
        .collect()
}

fn default_fallback_color() -> String {
    crate::category::FALLBACK_COLOR.to_string()
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            fallback_color: default_fallback_color(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskmate.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    pub fn load_or_default(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.storage.validate()?;
        self.categories.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> crate::error::Result<()> {
        for (field, key) in [
            ("storage.tasks_key", &self.tasks_key),
            ("storage.categories_key", &self.categories_key),
        ] {
            validate_slot_key(key, field)?;
        }
        if self.tasks_key == self.categories_key {
            return Err(crate::error::Error::InvalidConfig(
                "storage.tasks_key and storage.categories_key must differ".to_string(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl CategoriesConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.palette.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "categories.palette cannot be empty".to_string(),
            ));
        }
        if self.palette.iter().any(|color| color.trim().is_empty()) {
            return Err(crate::error::Error::InvalidConfig(
                "categories.palette entries cannot be empty".to_string(),
            ));
        }
        if self.fallback_color.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "categories.fallback_color cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_slot_key(key: &str, field: &str) -> crate::error::Result<()> {
    if key.trim().is_empty() {
        return Err(crate::error::Error::InvalidConfig(format!(
            "{field}: key cannot be empty"
        )));
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(crate::error::Error::InvalidConfig(format!(
            "{field}: invalid key '{key}' (expected [A-Za-z0-9_-])"
        )));
    }
    Ok(())
}

/// Resolve the data directory: explicit path first, then the platform default
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    directories::ProjectDirs::from("", "", "taskmate")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".taskmate"))
}
