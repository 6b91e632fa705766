//! Cascading file resolution
//!
//! Resolves a logical `(directory, name, extension)` against the overlay
//! roots. Root order, highest priority first:
//!
//! 1. Flash roots (consumed by the lookup)
//! 2. Request-scoped extra roots, when a request is active
//! 3. Persistent roots, in registration order
//!
//! A name may carry a namespace, `Auth::views/login`, which redirects the
//! lookup to that namespace's package root. A leading `::` forces a lookup
//! against the persistent roots only.

use crate::cache::{
    CacheSettings, CacheStore, CachedLookup, ContextFingerprint, LookupKey, LookupMode,
    PersistStatus, RootScope,
};
use crate::config::Config;
use crate::context::{
    LoadedRegistry, NamespaceMap, NamespaceResolver, RequestContext, StaticRegistry,
    StaticRequest,
};
use crate::error::{CascadeError, CascadeResult};
use crate::lister;
use crate::paths::{normalize_dir, unify_separators, OverlayRoot, PathSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Separator between a namespace prefix and a name
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Extension used when a lookup does not name one
pub const DEFAULT_EXTENSION: &str = ".toml";

/// Trailing directory stripped from namespace roots to reach the package root
pub const DEFAULT_NAMESPACE_SUBDIR: &str = "classes";

/// A single resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    directory: String,
    name: String,
    extension: Option<String>,
    mode: LookupMode,
    use_cache: bool,
}

impl Lookup {
    /// First match of `directory/name` using the resolver's default extension
    pub fn new(directory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            extension: None,
            mode: LookupMode::Single,
            use_cache: true,
        }
    }

    /// Extension appended to the name, e.g. `.toml`. An empty string
    /// matches the name as given.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Collect matches from every root instead of stopping at the first
    pub fn all(self) -> Self {
        self.multiple(true)
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.mode = if multiple {
            LookupMode::Multiple
        } else {
            LookupMode::Single
        };
        self
    }

    /// Skip the lookup cache for both reading and writing
    pub fn no_cache(self) -> Self {
        self.use_cache(false)
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn mode(&self) -> LookupMode {
        self.mode
    }
}

/// Result of [`Resolver::locate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Single-mode match
    Found(PathBuf),

    /// Single-mode miss
    NotFound,

    /// Multi-mode matches in root order; empty on a miss
    All(Vec<PathBuf>),
}

impl Located {
    fn empty(mode: LookupMode) -> Self {
        match mode {
            LookupMode::Single => Self::NotFound,
            LookupMode::Multiple => Self::All(Vec::new()),
        }
    }

    fn from_cached(entry: CachedLookup, mode: LookupMode) -> Self {
        match entry {
            CachedLookup::Single { path } => Self::Found(path),
            CachedLookup::Multiple { paths } => Self::All(paths),
            CachedLookup::Absent => Self::empty(mode),
        }
    }

    fn to_cached(&self) -> Option<CachedLookup> {
        match self {
            Self::Found(path) => Some(CachedLookup::Single { path: path.clone() }),
            Self::All(paths) if !paths.is_empty() => Some(CachedLookup::Multiple {
                paths: paths.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        match self {
            Self::Found(_) => true,
            Self::NotFound => false,
            Self::All(paths) => !paths.is_empty(),
        }
    }

    /// Highest-priority match
    pub fn first(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound => None,
            Self::All(paths) => paths.first().map(PathBuf::as_path),
        }
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        match self {
            Self::Found(path) => vec![path],
            Self::NotFound => Vec::new(),
            Self::All(paths) => paths,
        }
    }
}

/// Roots and identity selected for a name after namespace handling
struct Target {
    roots: Vec<OverlayRoot>,
    scope: RootScope,
    namespace: Option<String>,
    name: String,
}

/// Cascading resolver over a [`PathSet`] with a persistent lookup cache
pub struct Resolver {
    paths: PathSet,
    cache: CacheStore,
    caching: bool,
    default_extension: String,
    namespace_subdir: String,
    namespaces: Option<Box<dyn NamespaceResolver>>,
    request: Option<Box<dyn RequestContext>>,
    modules: Option<Box<dyn LoadedRegistry>>,
    packages: Option<Box<dyn LoadedRegistry>>,
}

impl Resolver {
    pub fn new(paths: PathSet, cache: CacheStore) -> Self {
        Self {
            paths,
            cache,
            caching: true,
            default_extension: DEFAULT_EXTENSION.to_string(),
            namespace_subdir: DEFAULT_NAMESPACE_SUBDIR.to_string(),
            namespaces: None,
            request: None,
            modules: None,
            packages: None,
        }
    }

    /// Build a resolver from configuration.
    ///
    /// Cache settings are not resolved here; the cache store derives them
    /// from the configuration the first time it needs them.
    pub fn from_config(config: &Config) -> CascadeResult<Self> {
        let paths = PathSet::from_roots(&config.resolver.roots)?;

        let settings_config = config.clone();
        let cache = CacheStore::deferred(config.cache.name.clone(), move || {
            settings_config.cache_settings()
        });

        let mut resolver = Self::new(paths, cache)
            .with_caching(config.cache.enabled)
            .with_default_extension(config.resolver.default_extension.clone())
            .with_namespace_subdir(config.resolver.namespace_subdir.clone());

        if !config.namespaces.is_empty() {
            let map: NamespaceMap = config.namespaces.clone().into_iter().collect();
            resolver = resolver.with_namespaces(map);
        }
        if !config.context.modules.is_empty() {
            resolver = resolver.with_modules(StaticRegistry::new(config.context.modules.clone()));
        }
        if !config.context.packages.is_empty() {
            resolver = resolver.with_packages(StaticRegistry::new(config.context.packages.clone()));
        }
        if config.context.active_module.is_some() || !config.context.extra_roots.is_empty() {
            resolver.begin_request(StaticRequest::new(
                config.context.extra_roots.clone(),
                config.context.active_module.clone(),
            ));
        }

        Ok(resolver)
    }

    /// Build a resolver with a cache in `settings.dir`
    pub fn with_cache_settings(paths: PathSet, name: &str, settings: CacheSettings) -> Self {
        Self::new(paths, CacheStore::new(name, settings))
    }

    /// Disable to ignore the lookup cache regardless of each lookup's choice
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    pub fn with_namespace_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.namespace_subdir = subdir.into();
        self
    }

    pub fn with_namespaces(mut self, namespaces: impl NamespaceResolver + 'static) -> Self {
        self.namespaces = Some(Box::new(namespaces));
        self
    }

    pub fn with_modules(mut self, modules: impl LoadedRegistry + 'static) -> Self {
        self.modules = Some(Box::new(modules));
        self
    }

    pub fn with_packages(mut self, packages: impl LoadedRegistry + 'static) -> Self {
        self.packages = Some(Box::new(packages));
        self
    }

    /// Replace the module registry, e.g. after loading a module
    pub fn set_modules(&mut self, modules: Option<Box<dyn LoadedRegistry>>) {
        self.modules = modules;
    }

    /// Replace the package registry, e.g. after loading a package
    pub fn set_packages(&mut self, packages: Option<Box<dyn LoadedRegistry>>) {
        self.packages = packages;
    }

    /// Activate a request context until [`Resolver::end_request`]
    pub fn begin_request(&mut self, request: impl RequestContext + 'static) {
        self.request = Some(Box::new(request));
    }

    pub fn end_request(&mut self) {
        self.request = None;
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn paths_mut(&mut self) -> &mut PathSet {
        &mut self.paths
    }

    pub fn cache_mut(&mut self) -> &mut CacheStore {
        &mut self.cache
    }

    /// Write cached lookups to disk if any were added
    pub fn persist(&mut self) -> PersistStatus {
        self.cache.persist()
    }

    /// First match for `directory/name`, using the cache
    pub fn find(&mut self, directory: &str, name: &str) -> CascadeResult<Option<PathBuf>> {
        let located = self.locate(&Lookup::new(directory, name))?;
        Ok(located.first().map(Path::to_path_buf))
    }

    /// Every match for `directory/name` in root order, using the cache
    pub fn find_all(&mut self, directory: &str, name: &str) -> CascadeResult<Vec<PathBuf>> {
        Ok(self.locate(&Lookup::new(directory, name).all())?.into_paths())
    }

    /// Resolve a lookup against the overlay roots.
    ///
    /// Misses are not errors. The only failure is an empty name, including
    /// one that is empty after its `::` prefix.
    ///
    /// While flash roots are queued the cache is neither read nor written;
    /// the lookup always probes the filesystem and consumes the flash roots.
    pub fn locate(&mut self, lookup: &Lookup) -> CascadeResult<Located> {
        if lookup.name.is_empty() {
            return Err(CascadeError::invalid("lookup name cannot be empty"));
        }

        let extension = lookup
            .extension
            .clone()
            .unwrap_or_else(|| self.default_extension.clone());

        if is_absolute_name(&lookup.name) {
            return Ok(locate_absolute(&lookup.name, &extension, lookup.mode));
        }

        let target = self.select_target(&lookup.name)?;

        let flash = self.paths.take_flash();
        // A flash-shadowed answer must not outlive the flash roots
        let use_cache = self.caching && lookup.use_cache && flash.is_empty();
        if !flash.is_empty() {
            debug!("Consumed {} flash roots", flash.len());
        }

        let mut roots = flash;
        roots.extend(target.roots);

        let relative = relative_path(&lookup.directory, &target.name, &extension);
        let key = LookupKey::new(
            lookup.mode,
            target.scope,
            target.namespace.as_deref(),
            &self.fingerprint(),
            &relative,
        );

        if use_cache {
            if let Some(entry) = self.cache.lookup(&key) {
                debug!("Cache hit for {}", relative);
                return Ok(Located::from_cached(entry, lookup.mode));
            }
        }

        let found = probe(&roots, &relative, lookup.mode);
        debug!(
            "Resolved {} across {} roots: {:?}",
            relative,
            roots.len(),
            found
        );

        if use_cache {
            if let Some(entry) = found.to_cached() {
                self.cache.insert(&key, entry);
            }
        }

        Ok(found)
    }

    /// Every file matching `directory/filter` across all roots.
    ///
    /// Request roots come first, then flash roots (consumed), then the
    /// persistent roots. Never cached.
    pub fn list_files(&mut self, directory: &str, filter: &str) -> CascadeResult<Vec<PathBuf>> {
        lister::validate_filter(filter)?;

        let mut roots = self.request_roots();
        roots.extend(self.paths.ordered_roots());

        lister::list_files(&roots, directory, filter)
    }

    fn select_target(&self, name: &str) -> CascadeResult<Target> {
        let target = match name.rfind(NAMESPACE_SEPARATOR) {
            None => self.plain_target(name),
            Some(0) => Target {
                roots: self.paths.roots().to_vec(),
                scope: RootScope::Base,
                namespace: None,
                name: name[NAMESPACE_SEPARATOR.len()..].to_string(),
            },
            Some(pos) => {
                let prefix = &name[..pos];
                let rest = &name[pos + NAMESPACE_SEPARATOR.len()..];

                match self.namespace_root(prefix) {
                    Some(root) => Target {
                        roots: vec![root],
                        scope: RootScope::Namespace,
                        namespace: Some(prefix.to_string()),
                        name: rest.to_string(),
                    },
                    None => {
                        debug!("Namespace '{}' not found, using default roots", prefix);
                        self.plain_target(rest)
                    }
                }
            }
        };

        if target.name.is_empty() {
            return Err(CascadeError::invalid(format!(
                "lookup name '{}' has nothing after '{}'",
                name, NAMESPACE_SEPARATOR
            )));
        }
        Ok(target)
    }

    fn plain_target(&self, name: &str) -> Target {
        let mut roots = self.request_roots();
        roots.extend(self.paths.roots().iter().cloned());
        Target {
            roots,
            scope: RootScope::Scoped,
            namespace: None,
            name: name.to_string(),
        }
    }

    fn namespace_root(&self, prefix: &str) -> Option<OverlayRoot> {
        let resolved = self.namespaces.as_ref()?.resolve(prefix)?;
        let package_root = strip_subdir(&resolved, &self.namespace_subdir);

        match OverlayRoot::new(package_root) {
            Ok(root) => Some(root),
            Err(e) => {
                warn!("Ignoring namespace '{}' root: {}", prefix, e);
                None
            }
        }
    }

    fn request_roots(&self) -> Vec<OverlayRoot> {
        let Some(request) = &self.request else {
            return Vec::new();
        };

        request
            .extra_roots()
            .into_iter()
            .filter_map(|path| match OverlayRoot::new(&path) {
                Ok(root) => Some(root),
                Err(e) => {
                    warn!("Ignoring request root {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }

    fn fingerprint(&self) -> ContextFingerprint {
        ContextFingerprint::new(
            self.request.as_ref().and_then(|r| r.active_module()),
            self.modules
                .as_ref()
                .map(|m| m.loaded_names())
                .unwrap_or_default(),
            self.packages
                .as_ref()
                .map(|p| p.loaded_names())
                .unwrap_or_default(),
        )
    }
}

/// Leading separator or a drive prefix like `C:\`
fn is_absolute_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes {
        [b'/' | b'\\', ..] => true,
        [drive, b':', b'\\' | b'/', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

fn locate_absolute(name: &str, extension: &str, mode: LookupMode) -> Located {
    let mut path = PathBuf::from(name);
    if !path.is_file() {
        path = PathBuf::from(format!("{}{}", name, extension));
    }

    if !path.is_file() {
        return Located::empty(mode);
    }

    match mode {
        LookupMode::Single => Located::Found(path),
        LookupMode::Multiple => Located::All(vec![path]),
    }
}

/// `directory/name.ext`, with the extension skipped when the name already
/// ends with it
fn relative_path(directory: &str, name: &str, extension: &str) -> String {
    let mut relative = normalize_dir(directory);
    relative.push_str(&unify_separators(name));
    if !extension.is_empty() && !name.ends_with(extension) {
        relative.push_str(extension);
    }
    relative
}

fn strip_subdir(root: &Path, subdir: &str) -> PathBuf {
    if !subdir.is_empty() && root.file_name().is_some_and(|name| name == subdir) {
        if let Some(parent) = root.parent() {
            return parent.to_path_buf();
        }
    }
    root.to_path_buf()
}

fn probe(roots: &[OverlayRoot], relative: &str, mode: LookupMode) -> Located {
    let mut matches = Vec::new();

    for root in roots {
        let candidate = root.join(relative);
        if !candidate.is_file() {
            continue;
        }

        if mode == LookupMode::Single {
            return Located::Found(candidate);
        }
        matches.push(candidate);
    }

    match mode {
        LookupMode::Single => Located::NotFound,
        LookupMode::Multiple => Located::All(matches),
    }
}
