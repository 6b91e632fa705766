//! Persistent lookup cache
//!
//! Resolved lookups are remembered in memory and written to disk once per
//! process, so later invocations skip the filesystem walk.
//!
//! # Invalidation
//!
//! - Keys fold in the loaded module/package context, so loading or unloading
//!   anything produces different keys rather than stale hits
//! - The whole blob expires `lifetime` seconds after its last write
//! - Only positive results are cached; a file created after a miss is found
//!   by the next lookup
//!
//! A hit is trusted without touching the filesystem. A file deleted after it
//! was cached is still returned until the cache expires or is cleared.

pub mod key;
pub mod schema;
pub mod store;

pub use key::{ContextFingerprint, LookupKey, LookupMode, RootScope};
pub use schema::{CacheFile, CacheMap, CachedLookup, SCHEMA_VERSION};
pub use store::{
    cache_file_name, CacheSettings, CacheStore, ModeStatus, PersistStatus, DEFAULT_DIR_MODE,
    DEFAULT_FILE_MODE, DEFAULT_LIFETIME_SECS,
};
