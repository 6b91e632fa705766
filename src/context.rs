//! Collaborators consulted by the resolver
//!
//! None of these are required. A resolver built without a request context or
//! registries simply omits their contributions to the root set and the cache
//! fingerprint.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Maps a namespace prefix to the directory holding its classes
pub trait NamespaceResolver {
    /// Root for `prefix`, or `None` when the namespace is unknown
    fn resolve(&self, prefix: &str) -> Option<PathBuf>;
}

/// Request-scoped overrides, present only while a request is being served
pub trait RequestContext {
    /// Roots searched ahead of the persistent roots, in priority order
    fn extra_roots(&self) -> Vec<PathBuf>;

    /// Module serving the request, if any
    fn active_module(&self) -> Option<String>;
}

/// A registry of loaded modules or packages
pub trait LoadedRegistry {
    /// Names of everything currently loaded
    fn loaded_names(&self) -> Vec<String>;
}

/// Namespace table backed by a fixed map.
///
/// Lookups try the exact prefix first and fall back to an ASCII
/// case-insensitive match, so `auth::login` finds a namespace registered as
/// `Auth`.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    entries: BTreeMap<String, PathBuf>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a namespace root
    pub fn insert(&mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) {
        self.entries.insert(prefix.into(), root.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for NamespaceMap
where
    K: Into<String>,
    V: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (prefix, root) in iter {
            map.insert(prefix, root);
        }
        map
    }
}

impl NamespaceResolver for NamespaceMap {
    fn resolve(&self, prefix: &str) -> Option<PathBuf> {
        if let Some(root) = self.entries.get(prefix) {
            return Some(root.clone());
        }

        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(prefix))
            .map(|(_, root)| root.clone())
    }
}

/// Request context with fixed values, used by the CLI and in tests
#[derive(Debug, Clone, Default)]
pub struct StaticRequest {
    pub extra_roots: Vec<PathBuf>,
    pub module: Option<String>,
}

impl StaticRequest {
    pub fn new(extra_roots: Vec<PathBuf>, module: Option<String>) -> Self {
        Self {
            extra_roots,
            module,
        }
    }
}

impl RequestContext for StaticRequest {
    fn extra_roots(&self) -> Vec<PathBuf> {
        self.extra_roots.clone()
    }

    fn active_module(&self) -> Option<String> {
        self.module.clone().filter(|m| !m.is_empty())
    }
}

/// Registry with a fixed list of loaded names
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry(pub Vec<String>);

impl StaticRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl LoadedRegistry for StaticRegistry {
    fn loaded_names(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_exact_match() {
        let map: NamespaceMap = [("Auth", "/pkg/auth/classes")].into_iter().collect();
        assert_eq!(map.resolve("Auth"), Some(PathBuf::from("/pkg/auth/classes")));
    }

    #[test]
    fn namespace_case_insensitive_fallback() {
        let map: NamespaceMap = [("Auth", "/pkg/auth/classes")].into_iter().collect();
        assert_eq!(map.resolve("auth"), Some(PathBuf::from("/pkg/auth/classes")));
        assert_eq!(map.resolve("unknown"), None);
    }

    #[test]
    fn static_request_ignores_empty_module() {
        let request = StaticRequest::new(vec![], Some(String::new()));
        assert_eq!(request.active_module(), None);

        let request = StaticRequest::new(vec![PathBuf::from("/mods/blog")], Some("blog".into()));
        assert_eq!(request.active_module().as_deref(), Some("blog"));
        assert_eq!(request.extra_roots().len(), 1);
    }

    #[test]
    fn static_registry_names() {
        let registry = StaticRegistry::new(["orm", "auth"]);
        assert_eq!(registry.loaded_names(), vec!["orm", "auth"]);
    }
}
