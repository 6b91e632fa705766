//! Cache key construction
//!
//! A [`LookupKey`] captures every input that can change the answer of a
//! lookup: multiplicity, the root set searched, namespace, the loaded module/package context and the
//! relative path. Keys are stored as a fixed-width SHA-256 prefix.

use sha2::{Digest, Sha256};
use std::fmt;

/// Bytes of SHA-256 kept in a key digest (32 hex chars)
const KEY_DIGEST_BYTES: usize = 16;

/// Whether a lookup wants the first match or every match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupMode {
    Single,
    Multiple,
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("S"),
            Self::Multiple => f.write_str("M"),
        }
    }
}

/// Which root set a lookup searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootScope {
    /// Request roots followed by the persistent roots
    Scoped,

    /// Persistent roots only (`::name`)
    Base,

    /// A namespace's package root
    Namespace,
}

impl fmt::Display for RootScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scoped => f.write_str("R"),
            Self::Base => f.write_str("B"),
            Self::Namespace => f.write_str("N"),
        }
    }
}

/// Active module plus loaded modules and packages.
///
/// Name lists are sorted on construction so load order never changes the
/// fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFingerprint {
    active_module: Option<String>,
    modules: Vec<String>,
    packages: Vec<String>,
}

impl ContextFingerprint {
    pub fn new(
        active_module: Option<String>,
        mut modules: Vec<String>,
        mut packages: Vec<String>,
    ) -> Self {
        modules.sort();
        packages.sort();
        Self {
            active_module: active_module.filter(|m| !m.is_empty()),
            modules,
            packages,
        }
    }

    pub fn active_module(&self) -> Option<&str> {
        self.active_module.as_deref()
    }

    fn encode(&self, buf: &mut String) {
        push_field(buf, "mod", self.active_module.as_deref().unwrap_or(""));
        push_list(buf, "mods", &self.modules);
        push_list(buf, "pkgs", &self.packages);
    }
}

/// Normalized lookup identity.
///
/// Every component is length-prefixed, so no combination of names can
/// collide with another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn new(
        mode: LookupMode,
        scope: RootScope,
        namespace: Option<&str>,
        context: &ContextFingerprint,
        relative_path: &str,
    ) -> Self {
        let mut buf = format!("{}{}|", mode, scope);
        push_field(&mut buf, "ns", namespace.unwrap_or(""));
        context.encode(&mut buf);
        push_field(&mut buf, "path", relative_path);
        Self(buf)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed-width hex digest used as the storage key
    pub fn digest(&self) -> String {
        digest_hex(self.0.as_bytes(), KEY_DIGEST_BYTES)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encode the first `bytes` bytes of the SHA-256 of `input`
pub(crate) fn digest_hex(input: &[u8], bytes: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let result = hasher.finalize();
    hex::encode(&result[..bytes])
}

fn push_field(buf: &mut String, tag: &str, value: &str) {
    buf.push_str(&format!("{}:{}:{};", tag, value.len(), value));
}

fn push_list(buf: &mut String, tag: &str, values: &[String]) {
    buf.push_str(&format!("{}:{}[", tag, values.len()));
    for value in values {
        buf.push_str(&format!("{}:{},", value.len(), value));
    }
    buf.push_str("];");
}
