//! On-disk format of a persisted lookup cache
//!
//! One JSON document per named cache:
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "cascade-paths",
//!   "written_at": "2026-10-16T09:12:44Z",
//!   "entries": {
//!     "3f0c...": { "kind": "single", "path": "/core/config/db.toml" },
//!     "a91d...": { "kind": "multiple", "paths": ["/app/lang/en.toml", "/core/lang/en.toml"] }
//!   }
//! }
//! ```
//!
//! Expiry uses the file modification time, not `written_at`.

use crate::error::CascadeResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Current schema version; any other version is discarded on load
pub const SCHEMA_VERSION: u32 = 1;

/// Key digest to cached result
pub type CacheMap = BTreeMap<String, CachedLookup>;

/// A cached lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachedLookup {
    /// First match of a single-result lookup
    Single { path: PathBuf },

    /// Every match of a multi-result lookup, in root order
    Multiple { paths: Vec<PathBuf> },

    /// Reserved for a negative result. The resolver never writes it and
    /// treats it as a miss when read.
    Absent,
}

impl CachedLookup {
    /// Whether this entry can answer a lookup
    pub fn is_hit(&self) -> bool {
        match self {
            Self::Single { .. } => true,
            Self::Multiple { paths } => !paths.is_empty(),
            Self::Absent => false,
        }
    }
}

/// Serialized form of a whole named cache
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheFile {
    pub version: u32,
    pub name: String,
    pub written_at: DateTime<Utc>,
    pub entries: CacheMap,
}

impl CacheFile {
    pub fn new(name: &str, entries: CacheMap) -> Self {
        Self {
            version: SCHEMA_VERSION,
            name: name.to_string(),
            written_at: Utc::now(),
            entries,
        }
    }

    /// Encode the complete document into one buffer
    pub fn to_bytes(&self) -> CascadeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a document, returning `None` for anything unreadable or from
    /// another schema version
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let file: Self = serde_json::from_slice(bytes).ok()?;
        (file.version == SCHEMA_VERSION).then_some(file)
    }
}
