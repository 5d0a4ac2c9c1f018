//! Configuration for Warden
//!
//! The core reads a single TOML file, `configs/core.toml` under the base
//! directory. A default file is written on first start.
//!
//! ```toml
//! version = 1
//! debug = false
//!
//! [storage]
//! backend = "file"          # or "memory"
//! path = "data"             # relative to the base directory
//! players_collection = "players"
//! groups_collection = "groups"
//!
//! [groups]
//! default_group = "default"
//! create_default = true
//! ```

mod loader;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{configs_dir, core_config_path, resolve_against, warden_base_dir, HOME_ENV};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Neither `WARDEN_HOME` nor the working directory is usable
    #[error("Config directory not available - could not resolve base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; nothing survives a restart
    Memory,
    /// One JSON file per document under `storage.path`
    #[default]
    File,
}

/// `[storage]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Data directory, relative to the base directory unless absolute
    pub path: PathBuf,

    pub players_collection: String,
    pub groups_collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data"),
            players_collection: "players".to_string(),
            groups_collection: "groups".to_string(),
        }
    }
}

/// `[groups]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    /// Name of the group flagged default when none is
    pub default_group: String,

    /// Create (or flag) `default_group` at startup if no group is default
    pub create_default: bool,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            default_group: "default".to_string(),
            create_default: true,
        }
    }
}

/// Core configuration.
///
/// Loaded from `configs/core.toml` under the base directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    pub storage: StorageConfig,

    pub groups: GroupsConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            storage: StorageConfig::default(),
            groups: GroupsConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load core config from file, creating default if missing.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&core_config_path()?)
    }

    /// Load from an explicit path, creating a default file if missing
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded core config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!("Created default core config at {:?}", path);
            Ok(default)
        }
    }

    /// Save core config to file.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&core_config_path()?)
    }

    /// Save to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved core config to {:?}", path);
        Ok(())
    }

    /// Reload core config from file.
    pub fn reload(&mut self) -> ConfigResult<()> {
        self.reload_from(&core_config_path()?)
    }

    pub fn reload_from(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded core config from {:?}", path);
        Ok(())
    }

    /// Data directory with relative paths anchored at the base directory
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        Ok(resolve_against(&warden_base_dir()?, &self.storage.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_config_default() {
        let config = CoreConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.groups.default_group, "default");
        assert!(config.groups.create_default);
    }

    #[test]
    fn test_core_config_serialize() {
        let mut config = CoreConfig {
            version: 2,
            debug: true,
            ..CoreConfig::default()
        };
        config.storage.backend = StorageBackend::Memory;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 2"));
        assert!(toml_str.contains("debug = true"));
        assert!(toml_str.contains("backend = \"memory\""));

        let parsed: CoreConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: CoreConfig = toml::from_str("[groups]\ndefault_group = \"guest\"\n").unwrap();
        assert_eq!(config.groups.default_group, "guest");
        assert!(config.groups.create_default);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = toml::from_str::<CoreConfig>("[storage]\nbackend = \"mongo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_creates_default_then_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs").join("core.toml");

        let mut config = CoreConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, CoreConfig::default());

        std::fs::write(&path, "debug = true\n").unwrap();
        config.reload_from(&path).unwrap();
        assert!(config.debug);

        let again = CoreConfig::load_from(&path).unwrap();
        assert!(again.debug);
    }

    #[test]
    fn test_absolute_data_dir_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::default();
        config.storage.path = dir.path().to_path_buf();
        assert_eq!(config.data_dir().unwrap(), dir.path());
    }
}
