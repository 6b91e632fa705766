//! Overlay roots and the ordered search path
//!
//! A [`PathSet`] holds the persistent overlay roots in priority order plus a
//! queue of flash roots. Flash roots are consulted ahead of everything else
//! and are consumed by the next resolution event that reads them.

use crate::error::{CascadeError, CascadeResult};
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// A directory participating in cascading resolution.
///
/// Stored in canonical form: every `/` or `\` is replaced by the platform
/// separator and exactly one trailing separator is kept. Two roots are equal
/// when their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverlayRoot(String);

impl OverlayRoot {
    /// Normalize a path into an overlay root
    pub fn new(path: impl AsRef<Path>) -> CascadeResult<Self> {
        let path = path.as_ref();
        let raw = path.to_str().ok_or_else(|| {
            CascadeError::invalid(format!("overlay root {} is not valid UTF-8", path.display()))
        })?;

        if raw.trim().is_empty() {
            return Err(CascadeError::invalid("overlay root cannot be empty"));
        }

        Ok(Self(normalize_dir(raw)))
    }

    /// Canonical string form, always ending in a separator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a relative path produced by the resolver
    pub fn join(&self, relative: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.0, relative))
    }
}

impl fmt::Display for OverlayRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for OverlayRoot {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Canonicalize separators and force a single trailing separator.
///
/// An empty input yields an empty string so relative paths can be built
/// without a leading separator.
pub(crate) fn normalize_dir(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let unified = unify_separators(raw);
    let mut dir = unified.trim_end_matches(MAIN_SEPARATOR).to_string();
    dir.push(MAIN_SEPARATOR);
    dir
}

/// Replace both `/` and `\` with the platform separator
pub(crate) fn unify_separators(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// Where [`PathSet::add_root`] inserts a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Lowest priority, checked last
    #[default]
    Append,

    /// Highest persistent priority, checked first
    Prepend,

    /// Zero-based insertion index; must not exceed the current length
    Index(usize),
}

/// Ordered overlay roots plus single-use flash roots
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    roots: Vec<OverlayRoot>,
    flash: Vec<OverlayRoot>,
}

impl PathSet {
    /// Create an empty path set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path set from roots in priority order
    pub fn from_roots<I, P>(paths: I) -> CascadeResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = Self::new();
        set.add_roots(paths, Position::Append)?;
        Ok(set)
    }

    /// Add a single root at the given position.
    ///
    /// No de-duplication is performed: adding the same root twice makes the
    /// resolver probe it twice.
    pub fn add_root(&mut self, path: impl AsRef<Path>, position: Position) -> CascadeResult<()> {
        let root = OverlayRoot::new(path)?;
        let index = self.insertion_index(position)?;
        self.roots.insert(index, root);
        Ok(())
    }

    /// Add several roots at one position, keeping their relative order.
    ///
    /// Nothing is inserted if any path is invalid or the position is out of
    /// range.
    pub fn add_roots<I, P>(&mut self, paths: I, position: Position) -> CascadeResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = paths
            .into_iter()
            .map(OverlayRoot::new)
            .collect::<CascadeResult<Vec<_>>>()?;
        let index = self.insertion_index(position)?;
        self.roots.splice(index..index, roots);
        Ok(())
    }

    /// Remove the first root equal to `path` once normalized.
    ///
    /// Returns whether a root was removed; a missing root is not an error.
    pub fn remove_root(&mut self, path: impl AsRef<Path>) -> bool {
        let Ok(target) = OverlayRoot::new(path) else {
            return false;
        };

        match self.roots.iter().position(|r| *r == target) {
            Some(index) => {
                self.roots.remove(index);
                true
            }
            None => false,
        }
    }

    /// Queue a flash root for the next resolution event
    pub fn push_flash(&mut self, path: impl AsRef<Path>) -> CascadeResult<()> {
        self.flash.push(OverlayRoot::new(path)?);
        Ok(())
    }

    /// Queue several flash roots, in order
    pub fn push_flash_all<I, P>(&mut self, paths: I) -> CascadeResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = paths
            .into_iter()
            .map(OverlayRoot::new)
            .collect::<CascadeResult<Vec<_>>>()?;
        self.flash.extend(roots);
        Ok(())
    }

    /// Drop all queued flash roots
    pub fn clear_flash(&mut self) {
        self.flash.clear();
    }

    /// Flash roots followed by persistent roots. Consumes the flash queue.
    pub fn ordered_roots(&mut self) -> Vec<OverlayRoot> {
        let mut ordered = self.take_flash();
        ordered.extend(self.roots.iter().cloned());
        ordered
    }

    /// Flash roots followed by persistent roots, without consuming anything
    pub fn peek_roots(&self) -> Vec<OverlayRoot> {
        self.flash.iter().chain(self.roots.iter()).cloned().collect()
    }

    /// Take the flash queue, leaving it empty
    pub fn take_flash(&mut self) -> Vec<OverlayRoot> {
        std::mem::take(&mut self.flash)
    }

    /// Persistent roots in priority order
    pub fn roots(&self) -> &[OverlayRoot] {
        &self.roots
    }

    /// Currently queued flash roots
    pub fn flash(&self) -> &[OverlayRoot] {
        &self.flash
    }

    /// Whether flash roots are queued
    pub fn has_flash(&self) -> bool {
        !self.flash.is_empty()
    }

    /// Number of persistent roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether there are no persistent roots
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn insertion_index(&self, position: Position) -> CascadeResult<usize> {
        match position {
            Position::Append => Ok(self.roots.len()),
            Position::Prepend => Ok(0),
            Position::Index(index) if index > self.roots.len() => Err(CascadeError::OutOfRange {
                position: index,
                len: self.roots.len(),
            }),
            Position::Index(index) => Ok(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(roots: &[OverlayRoot]) -> Vec<&str> {
        roots.iter().map(|r| r.as_str()).collect()
    }

    #[test]
    fn root_normalizes_separators() {
        assert_eq!(OverlayRoot::new("/app").unwrap().as_str(), "/app/");
        assert_eq!(OverlayRoot::new("/app///").unwrap().as_str(), "/app/");
        assert_eq!(OverlayRoot::new("/srv\\core\\").unwrap().as_str(), "/srv/core/");
        assert_eq!(OverlayRoot::new("/").unwrap().as_str(), "/");
    }

    #[test]
    fn root_equality_uses_normalized_form() {
        assert_eq!(OverlayRoot::new("/app").unwrap(), OverlayRoot::new("/app/").unwrap());
    }

    #[test]
    fn root_rejects_empty() {
        let err = OverlayRoot::new("").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn root_join() {
        let root = OverlayRoot::new("/core").unwrap();
        assert_eq!(root.join("config/db.toml"), PathBuf::from("/core/config/db.toml"));
    }

    #[test]
    fn add_root_positions() {
        let mut set = PathSet::from_roots(["/a", "/b"]).unwrap();
        set.add_root("/c", Position::Append).unwrap();
        set.add_root("/first", Position::Prepend).unwrap();
        set.add_root("/mid", Position::Index(2)).unwrap();

        assert_eq!(names(set.roots()), vec!["/first/", "/a/", "/mid/", "/b/", "/c/"]);
    }

    #[test]
    fn add_root_at_len_appends() {
        let mut set = PathSet::from_roots(["/a"]).unwrap();
        set.add_root("/b", Position::Index(1)).unwrap();
        assert_eq!(names(set.roots()), vec!["/a/", "/b/"]);
    }

    #[test]
    fn add_root_out_of_range() {
        let mut set = PathSet::from_roots(["/a"]).unwrap();
        let err = set.add_root("/b", Position::Index(2)).unwrap_err();
        assert!(matches!(err, CascadeError::OutOfRange { position: 2, len: 1 }));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_roots_keeps_order_and_is_atomic() {
        let mut set = PathSet::from_roots(["/z"]).unwrap();
        set.add_roots(["/a", "/b"], Position::Prepend).unwrap();
        assert_eq!(names(set.roots()), vec!["/a/", "/b/", "/z/"]);

        assert!(set.add_roots(["/c", ""], Position::Append).is_err());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn duplicates_are_kept() {
        let set = PathSet::from_roots(["/a", "/a/"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn remove_root_first_match_only() {
        let mut set = PathSet::from_roots(["/a", "/b", "/a"]).unwrap();
        assert!(set.remove_root("/a/"));
        assert_eq!(names(set.roots()), vec!["/b/", "/a/"]);
        assert!(!set.remove_root("/missing"));
        assert!(!set.remove_root(""));
    }

    #[test]
    fn ordered_roots_consumes_flash() {
        let mut set = PathSet::from_roots(["/a"]).unwrap();
        set.push_flash("/flash").unwrap();

        assert_eq!(names(&set.peek_roots()), vec!["/flash/", "/a/"]);
        assert!(set.has_flash());

        assert_eq!(names(&set.ordered_roots()), vec!["/flash/", "/a/"]);
        assert!(!set.has_flash());
        assert_eq!(names(&set.ordered_roots()), vec!["/a/"]);
    }

    #[test]
    fn clear_flash_is_idempotent() {
        let mut set = PathSet::new();
        set.push_flash_all(["/x", "/y"]).unwrap();
        assert_eq!(set.flash().len(), 2);
        set.clear_flash();
        set.clear_flash();
        assert!(set.flash().is_empty());
    }

    #[test]
    fn normalize_dir_empty_stays_empty() {
        assert_eq!(normalize_dir(""), "");
        assert_eq!(normalize_dir("config"), "config/");
        assert_eq!(normalize_dir("views\\admin/"), "views/admin/");
    }
}
