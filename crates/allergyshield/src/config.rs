//! Configuration management for allergyshield.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::DangerScale;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "allergyshield";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "allergies.db";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "ALLERGYSHIELD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ALLERGYSHIELD_`, sections
///    separated by `__`, e.g. `ALLERGYSHIELD_DANGER__MAX_LEVEL=4`)
/// 2. TOML config file at `~/.config/allergyshield/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Danger-level scale.
    pub danger: DangerConfig,
    /// Display configuration.
    pub display: DisplayConfig,
    /// CSV import configuration.
    pub import: ImportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/allergyshield/allergies.db`
    pub database_path: Option<PathBuf>,
}

/// Danger-level scale configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerConfig {
    /// Lowest accepted danger level.
    pub min_level: i64,
    /// Highest accepted danger level.
    pub max_level: i64,
}

/// Display-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Layout used when rendering entries as plain text.
    pub layout: LayoutMode,
}

/// Import-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// What to do with imported rows whose allergen already exists.
    pub on_duplicate: DuplicatePolicy,
}

/// Rendering layout for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Pick based on the platform the binary was built for.
    #[default]
    Auto,
    /// Stacked cards, one field per line.
    Touch,
    /// One line per entry.
    Desktop,
}

/// Policy for imported rows whose allergen name is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Leave the stored entry unchanged.
    #[default]
    Skip,
    /// Overwrite the stored entry with the imported values.
    Update,
}

impl Default for DangerConfig {
    fn default() -> Self {
        let scale = DangerScale::default();
        Self {
            min_level: scale.min,
            max_level: scale.max,
        }
    }
}

impl LayoutMode {
    /// Resolve `Auto` to a concrete layout for this platform.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto => {
                if cfg!(any(target_os = "android", target_os = "ios")) {
                    Self::Touch
                } else {
                    Self::Desktop
                }
            }
            other => other,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ALLERGYSHIELD_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(&config_file).nested())
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.danger_scale().map(|_| ())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the danger scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bounds are inconsistent.
    pub fn danger_scale(&self) -> Result<DangerScale> {
        DangerScale::new(self.danger.min_level, self.danger.max_level)
    }

    /// Get the concrete layout for this platform.
    #[must_use]
    pub fn layout(&self) -> LayoutMode {
        self.display.layout.resolve()
    }
}
