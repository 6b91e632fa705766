//! Disk-backed lookup cache
//!
//! The in-memory map is filled from disk the first time it is touched and is
//! written back only by an explicit [`CacheStore::persist`], so a process
//! performs at most one write per named cache however many lookups it runs.
//!
//! A persisted blob carries a single timestamp (its modification time). Once
//! it is older than the configured lifetime the whole blob is discarded.
//! Reading never fails: a missing, stale, or corrupt file is an empty cache.

use crate::cache::key::{digest_hex, LookupKey};
use crate::cache::schema::{CacheFile, CacheMap, CachedLookup};
use crate::error::{CascadeError, CascadeResult};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Default lifetime of a persisted cache in seconds
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// Default mode for created cache directories
pub const DEFAULT_DIR_MODE: u32 = 0o777;

/// Default mode for written cache files
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// Extension of persisted cache files
const CACHE_FILE_EXT: &str = "pathcache";

/// Where and for how long caches are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub lifetime: Duration,
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl CacheSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lifetime: Duration::from_secs(DEFAULT_LIFETIME_SECS),
            dir_mode: DEFAULT_DIR_MODE,
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_modes(mut self, dir_mode: u32, file_mode: u32) -> Self {
        self.dir_mode = dir_mode;
        self.file_mode = file_mode;
        self
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::new(
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("cascade"),
        )
    }
}

/// Outcome of [`CacheStore::persist`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// Nothing changed since the last load or write
    Clean,

    /// Blob written and permissions applied
    Written,

    /// Blob written, but the configured file mode could not be applied
    Degraded { reason: String },

    /// Nothing was written; the in-memory cache is still dirty
    Failed { reason: String },
}

impl PersistStatus {
    /// Whether the on-disk cache now reflects memory
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Outcome of applying a permission mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeStatus {
    Applied,
    Unchanged,
    /// The platform refused the change; the path is still usable
    Skipped { reason: String },
}

type SettingsSource = Box<dyn FnOnce() -> CacheSettings>;

/// A named key/result cache persisted as one file
pub struct CacheStore {
    name: String,
    settings: Option<CacheSettings>,
    source: Option<SettingsSource>,
    entries: CacheMap,
    loaded: bool,
    dirty: bool,
}

impl CacheStore {
    /// Create a store with settings known up front
    pub fn new(name: impl Into<String>, settings: CacheSettings) -> Self {
        Self {
            name: name.into(),
            settings: Some(settings),
            source: None,
            entries: CacheMap::new(),
            loaded: false,
            dirty: false,
        }
    }

    /// Create a store whose settings are produced on first use
    pub fn deferred(
        name: impl Into<String>,
        source: impl FnOnce() -> CacheSettings + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            settings: None,
            source: Some(Box::new(source)),
            entries: CacheMap::new(),
            loaded: false,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether memory holds entries not yet written to disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Resolved settings, running the deferred source on first call
    pub fn settings(&mut self) -> &CacheSettings {
        if self.settings.is_none() {
            let settings = self.source.take().map(|source| source()).unwrap_or_default();
            debug!(
                "Cache '{}' settings resolved: dir={}, lifetime={}s",
                self.name,
                settings.dir.display(),
                settings.lifetime.as_secs()
            );
            self.settings = Some(settings);
        }
        self.settings.get_or_insert_with(CacheSettings::default)
    }

    /// Location of the persisted blob for this cache
    pub fn file_path(&mut self) -> PathBuf {
        let file_name = cache_file_name(&self.name);
        self.settings().dir.join(file_name)
    }

    /// Cached result for `key`, loading from disk on first access
    pub fn lookup(&mut self, key: &LookupKey) -> Option<CachedLookup> {
        self.ensure_loaded();
        self.entries
            .get(&key.digest())
            .filter(|entry| entry.is_hit())
            .cloned()
    }

    /// Store a result in memory and mark the cache dirty
    pub fn insert(&mut self, key: &LookupKey, value: CachedLookup) {
        self.ensure_loaded();
        self.entries.insert(key.digest(), value);
        self.dirty = true;
    }

    /// Number of entries in memory, loading from disk on first access
    pub fn len(&mut self) -> usize {
        self.ensure_loaded();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Entries in memory, loading from disk on first access
    pub fn entries(&mut self) -> &CacheMap {
        self.ensure_loaded();
        &self.entries
    }

    /// Read the persisted blob for this cache.
    ///
    /// Returns an empty map when the file is missing, unreadable, corrupt or
    /// older than the lifetime. A stale file is deleted best-effort.
    pub fn load(&mut self) -> CacheMap {
        let path = self.file_path();
        let lifetime = self.settings().lifetime;

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!("No usable cache at {}: {}", path.display(), e);
                return CacheMap::new();
            }
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= lifetime {
            debug!(
                "Cache {} expired ({}s old, lifetime {}s)",
                path.display(),
                age.as_secs(),
                lifetime.as_secs()
            );
            if let Err(e) = fs::remove_file(&path) {
                debug!("Could not remove expired cache {}: {}", path.display(), e);
            }
            return CacheMap::new();
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read cache {}: {}", path.display(), e);
                return CacheMap::new();
            }
        };

        match CacheFile::from_bytes(&bytes) {
            Some(file) => {
                debug!("Loaded {} cached lookups from {}", file.entries.len(), path.display());
                file.entries
            }
            None => {
                warn!("Discarding unreadable cache {}", path.display());
                CacheMap::new()
            }
        }
    }

    /// Write the in-memory map to disk if it changed.
    ///
    /// The blob is written to a temporary file in the cache directory and
    /// renamed into place, so readers see the old or the new file, never a
    /// partial one. Concurrent writers race; the last rename wins.
    pub fn persist(&mut self) -> PersistStatus {
        if !self.dirty {
            return PersistStatus::Clean;
        }

        let settings = self.settings().clone();
        let path = self.file_path();

        if let Err(e) = ensure_dir(&settings.dir, settings.dir_mode) {
            warn!("Cannot create cache directory {}: {}", settings.dir.display(), e);
            return PersistStatus::Failed {
                reason: format!("creating {}: {}", settings.dir.display(), e),
            };
        }

        let bytes = match CacheFile::new(&self.name, self.entries.clone()).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot encode cache '{}': {}", self.name, e);
                return PersistStatus::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = write_atomic(&settings.dir, &path, &bytes) {
            warn!("Failed to write cache {}: {}", path.display(), e);
            return PersistStatus::Failed {
                reason: format!("writing {}: {}", path.display(), e),
            };
        }

        self.dirty = false;

        let status = match apply_mode(&path, settings.file_mode) {
            Ok(ModeStatus::Applied | ModeStatus::Unchanged) => PersistStatus::Written,
            Ok(ModeStatus::Skipped { reason }) => PersistStatus::Degraded { reason },
            Err(e) => PersistStatus::Degraded {
                reason: e.to_string(),
            },
        };

        match &status {
            PersistStatus::Degraded { reason } => warn!(
                "Cache written to {} but mode {:o} not applied: {}",
                path.display(),
                settings.file_mode,
                reason
            ),
            _ => info!("Persisted {} cached lookups to {}", self.entries.len(), path.display()),
        }

        status
    }

    /// Forget every entry and remove the persisted blob.
    ///
    /// Returns whether a file was removed.
    pub fn clear(&mut self) -> CascadeResult<bool> {
        let path = self.file_path();
        self.entries.clear();
        self.loaded = true;
        self.dirty = false;

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed cache {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CascadeError::io(format!("removing cache {}", path.display()), e)),
        }
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.entries = self.load();
        self.loaded = true;
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("entries", &self.entries.len())
            .field("loaded", &self.loaded)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// File name for a named cache: hash of the name plus extension
pub fn cache_file_name(name: &str) -> String {
    format!("{}.{}", digest_hex(name.as_bytes(), 16), CACHE_FILE_EXT)
}

/// Create the cache directory (and parents) if missing, then apply its mode.
///
/// An existing directory is left as it is.
fn ensure_dir(dir: &Path, mode: u32) -> io::Result<ModeStatus> {
    if dir.is_dir() {
        return Ok(ModeStatus::Unchanged);
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    builder.create(dir)?;

    // umask may have narrowed the mode
    apply_mode(dir, mode)
}

/// Apply a permission mode, treating a refusal as non-fatal
fn apply_mode(path: &Path, mode: u32) -> io::Result<ModeStatus> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let current = fs::metadata(path)?.permissions().mode() & 0o7777;
        if current == mode {
            return Ok(ModeStatus::Unchanged);
        }

        match fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
            Ok(()) => Ok(ModeStatus::Applied),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(ModeStatus::Skipped {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(ModeStatus::Unchanged)
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file_mut().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
