//! Configuration schema for Cascade
//!
//! Configuration is stored at `~/.config/cascade/config.toml`, optionally
//! overridden by a project-local `.cascade.toml`.

use crate::cache::{CacheSettings, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_LIFETIME_SECS};
use crate::resolver::{DEFAULT_EXTENSION, DEFAULT_NAMESPACE_SUBDIR};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Highest permission mode accepted, including setuid/setgid/sticky bits
const MAX_MODE: u32 = 0o7777;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Search path settings
    pub resolver: ResolverConfig,

    /// Loaded modules, packages and request overrides
    pub context: ContextConfig,

    /// Lookup cache settings
    pub cache: CacheConfig,

    /// Modes for created cache directories and files
    pub permissions: PermissionsConfig,

    /// Namespace prefix to class root, e.g. `Auth = "/srv/pkg/auth/classes"`
    pub namespaces: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Cache settings derived from the `[cache]` and `[permissions]` sections
    pub fn cache_settings(&self) -> CacheSettings {
        let dir = self
            .cache
            .dir
            .clone()
            .unwrap_or_else(super::ConfigManager::default_cache_dir);

        CacheSettings::new(dir)
            .with_lifetime(Duration::from_secs(self.cache.lifetime_secs))
            .with_modes(self.permissions.dir_mode, self.permissions.file_mode)
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Search path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Overlay roots, highest priority first
    pub roots: Vec<PathBuf>,

    /// Extension appended when a lookup does not give one
    pub default_extension: String,

    /// Directory stripped from namespace roots to reach the package root
    pub namespace_subdir: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            roots: vec![],
            default_extension: DEFAULT_EXTENSION.to_string(),
            namespace_subdir: DEFAULT_NAMESPACE_SUBDIR.to_string(),
        }
    }
}

/// Module and package context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Module serving the current request
    pub active_module: Option<String>,

    /// Request-scoped roots searched ahead of the overlay roots
    pub extra_roots: Vec<PathBuf>,

    /// Loaded modules
    pub modules: Vec<String>,

    /// Loaded packages
    pub packages: Vec<String>,
}

/// Lookup cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Read and write the lookup cache (default: true)
    pub enabled: bool,

    /// Logical cache name; the file name is a hash of it
    pub name: String,

    /// Cache directory (default: platform cache dir)
    pub dir: Option<PathBuf>,

    /// Seconds a persisted cache stays valid (default: 1 hour)
    pub lifetime_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "cascade-paths".to_string(),
            dir: None,
            lifetime_secs: DEFAULT_LIFETIME_SECS,
        }
    }
}

/// Permission modes, written as TOML octal (`dir_mode = 0o755`) or as an
/// octal string (`dir_mode = "0755"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    #[serde(deserialize_with = "deserialize_mode")]
    pub dir_mode: u32,
    #[serde(deserialize_with = "deserialize_mode")]
    pub file_mode: u32,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            dir_mode: DEFAULT_DIR_MODE,
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

fn deserialize_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mode {
        Number(u32),
        Octal(String),
    }

    let mode = match Mode::deserialize(deserializer)? {
        Mode::Number(mode) => mode,
        Mode::Octal(text) => parse_octal_mode(&text).map_err(de::Error::custom)?,
    };

    if mode > MAX_MODE {
        return Err(de::Error::custom(format!(
            "mode {:o} is larger than {:o}",
            mode, MAX_MODE
        )));
    }
    Ok(mode)
}

/// Parse `"0755"`, `"755"` or `"0o755"`
fn parse_octal_mode(text: &str) -> Result<u32, String> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    u32::from_str_radix(digits, 8).map_err(|_| format!("'{}' is not an octal mode", text))
}
