//! Configuration module for taggart
//!
//! Manages the catalog location, upload directory, pagination and tag alias
//! groups. Configuration is stored as TOML in the user's config directory
//! and may be overridden through `TAGGART_*` environment variables.
//!
//! Callers never read a global: they hold a [`ConfigHandle`] and take an
//! immutable [`snapshot`](ConfigHandle::snapshot) at call time. Reloading
//! swaps the snapshot; snapshots already handed out stay unchanged.

mod setup;

pub use setup::first_time_setup;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Prefix for environment overrides (`TAGGART_UPLOAD_DIR`, ...)
pub const ENV_PREFIX: &str = "TAGGART";

/// A set of equivalent tag values within one category
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TagAliasGroup {
    pub category: String,
    pub aliases: Vec<String>,
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TaggartConfig {
    /// Path of the catalog database file
    pub database_path: PathBuf,

    /// Root directory for uploaded files and their thumbnails
    pub upload_dir: PathBuf,

    /// Display name of this catalog
    pub instance_name: String,

    /// Gallery thumbnail width (CSS length)
    pub gallery_size: String,

    /// Files shown per listing page
    pub items_per_page: usize,

    /// Alias groups used when resolving tag filters
    pub tag_aliases: Vec<TagAliasGroup>,
}

impl Default for TaggartConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("database.db"),
            upload_dir: PathBuf::from("uploads"),
            instance_name: "Taggart".to_string(),
            gallery_size: "400px".to_string(),
            items_per_page: 100,
            tag_aliases: Vec::new(),
        }
    }
}

impl TaggartConfig {
    /// Get the default path of the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("taggart").join("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there first if
    /// the file does not exist. Environment overrides are applied on top.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or created,
    /// or if the resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file missing, writing defaults");
            Self::default().save(path)?;
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Check the configuration for unusable values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Message("database path cannot be empty".to_string()));
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message("upload directory cannot be empty".to_string()));
        }
        if self.items_per_page == 0 {
            return Err(ConfigError::Message(
                "items per page must be greater than zero".to_string(),
            ));
        }
        if let Some(group) = self.tag_aliases.iter().find(|g| g.category.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "alias group {:?} has an empty category",
                group.aliases
            )));
        }
        Ok(())
    }

    /// Replace the alias groups with groups parsed from JSON
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or a group is invalid;
    /// the current groups are kept in that case.
    pub fn set_aliases_json(&mut self, json: &str) -> Result<(), ConfigError> {
        let groups: Vec<TagAliasGroup> = serde_json::from_str(json)
            .map_err(|e| ConfigError::Message(format!("Invalid alias JSON: {e}")))?;
        let candidate = Self {
            tag_aliases: groups,
            ..self.clone()
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Alias groups as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization fails.
    pub fn aliases_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.tag_aliases)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize aliases: {e}")))
    }
}

/// Shared handle to the current configuration snapshot
#[derive(Debug)]
pub struct ConfigHandle {
    path: PathBuf,
    current: RwLock<Arc<TaggartConfig>>,
}

impl ConfigHandle {
    /// Load the configuration at `path` and wrap it in a handle
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading fails.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = TaggartConfig::load(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// Wrap an already built configuration (not backed by a loaded file)
    #[must_use]
    pub fn from_config(path: impl Into<PathBuf>, config: TaggartConfig) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Path of the backing config file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration in effect right now
    #[must_use]
    pub fn snapshot(&self) -> Arc<TaggartConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-read the config file and swap in the new snapshot
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is unreadable or invalid; the
    /// previous snapshot stays in effect.
    pub fn reload(&self) -> Result<Arc<TaggartConfig>, ConfigError> {
        let fresh = Arc::new(TaggartConfig::load(&self.path)?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&fresh);
        info!(path = %self.path.display(), "configuration reloaded");
        Ok(fresh)
    }

    /// Apply `change` to a copy of the current configuration, save it, then
    /// swap it in.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `change` fails, validation fails, or saving
    /// fails; the previous snapshot stays in effect.
    pub fn update(
        &self,
        change: impl FnOnce(&mut TaggartConfig) -> Result<(), ConfigError>,
    ) -> Result<Arc<TaggartConfig>, ConfigError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = TaggartConfig::clone(&guard);
        change(&mut next)?;
        next.validate()?;
        next.save(&self.path)?;
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        Ok(next)
    }
}
