//! Configuration management for Cascade

pub mod schema;

pub use schema::Config;

use crate::error::{CascadeError, CascadeResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of a project-local configuration
pub const LOCAL_CONFIG_NAME: &str = ".cascade.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cascade")
            .join("config.toml")
    }

    /// Get the default lookup cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cascade")
    }

    /// Find `.cascade.toml` in `start` or the nearest ancestor
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> CascadeResult<Config> {
        self.load_merged(None).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CascadeResult<Config> {
        let value = read_table(path).await?;
        into_config(value, path)
    }

    /// Load the global configuration with a local file layered on top.
    ///
    /// Tables are merged key by key; any other value in the local file
    /// replaces the global one.
    pub async fn load_merged(&self, local: Option<&Path>) -> CascadeResult<Config> {
        let mut merged = if self.config_path.exists() {
            read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Value::Table(toml::map::Map::new())
        };

        let origin = match local {
            Some(path) => {
                let overlay = read_table(path).await?;
                merge_values(&mut merged, overlay);
                debug!("Merged local config {}", path.display());
                path
            }
            None => self.config_path.as_path(),
        };

        into_config(merged, origin)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CascadeResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CascadeError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CascadeResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CascadeError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_table(path: &Path) -> CascadeResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| CascadeError::io(format!("reading config from {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| CascadeError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn into_config(value: toml::Value, path: &Path) -> CascadeResult<Config> {
    value.try_into().map_err(|e: toml::de::Error| CascadeError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
