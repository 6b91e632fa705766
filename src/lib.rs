//! Cascade - cascading file resolver
//!
//! Resolves logical file names against an ordered stack of overlay
//! directories (the first root holding a file wins), with single-use flash
//! roots, namespace indirection and a persistent lookup cache.
//!
//! ```rust,ignore
//! use cascade::{CacheSettings, Lookup, PathSet, Resolver};
//!
//! let paths = PathSet::from_roots(["/srv/app", "/srv/core"])?;
//! let mut resolver =
//!     Resolver::with_cache_settings(paths, "app", CacheSettings::new("/var/cache/app"));
//!
//! let db = resolver.locate(&Lookup::new("config", "db").extension(".php"))?;
//! resolver.persist();
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod lister;
pub mod paths;
pub mod resolver;
pub mod ui;

pub use cache::{CacheSettings, CacheStore, LookupMode, ModeStatus, PersistStatus};
pub use context::{LoadedRegistry, NamespaceMap, NamespaceResolver, RequestContext};
pub use error::{CascadeError, CascadeResult};
pub use paths::{OverlayRoot, PathSet, Position};
pub use resolver::{Located, Lookup, Resolver};
