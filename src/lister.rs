//! Directory listing across overlay roots
//!
//! Expands a glob filter inside the same subdirectory of every root and
//! concatenates the matches. Root order is preserved; within a root, matches
//! come back in the order the glob walk yields them (sorted by name).
//! Listings are never cached.

use crate::error::{CascadeError, CascadeResult};
use crate::paths::{normalize_dir, OverlayRoot};
use glob::Pattern;
use std::path::PathBuf;
use tracing::debug;

/// Every path matching `directory/filter` under each root, root by root
pub fn list_files(
    roots: &[OverlayRoot],
    directory: &str,
    filter: &str,
) -> CascadeResult<Vec<PathBuf>> {
    validate_filter(filter)?;

    let directory = normalize_dir(directory);
    let mut found = Vec::new();

    for root in roots {
        // Roots and directories are literal; only the filter is a pattern
        let prefix = Pattern::escape(&format!("{}{}", root, directory));
        let pattern = format!("{}{}", prefix, filter);

        let matches = match glob::glob(&pattern) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Skipping root {}: {}", root, e);
                continue;
            }
        };

        for entry in matches {
            match entry {
                Ok(path) => found.push(path),
                Err(e) => debug!("Unreadable entry under {}: {}", root, e),
            }
        }
    }

    debug!("Listed {} files for {}{}", found.len(), directory, filter);
    Ok(found)
}

pub(crate) fn validate_filter(filter: &str) -> CascadeResult<()> {
    if filter.is_empty() {
        return Err(CascadeError::InvalidPattern {
            pattern: String::new(),
            reason: "filter cannot be empty".to_string(),
        });
    }

    Pattern::new(filter)
        .map(|_| ())
        .map_err(|e| CascadeError::InvalidPattern {
            pattern: filter.to_string(),
            reason: e.msg.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn root(path: &Path) -> OverlayRoot {
        OverlayRoot::new(path).unwrap()
    }

    #[test]
    fn lists_root_by_root() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        let core = temp.path().join("core");
        touch(&app.join("config/b.toml"));
        touch(&app.join("config/a.toml"));
        touch(&core.join("config/a.toml"));
        touch(&core.join("config/skip.json"));

        let found = list_files(&[root(&app), root(&core)], "config", "*.toml").unwrap();

        assert_eq!(
            found,
            vec![
                app.join("config/a.toml"),
                app.join("config/b.toml"),
                core.join("config/a.toml"),
            ]
        );
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let found = list_files(&[root(temp.path())], "nowhere", "*").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_directory_lists_root() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("top.toml"));
        let found = list_files(&[root(temp.path())], "", "*.toml").unwrap();
        assert_eq!(found, vec![temp.path().join("top.toml")]);
    }

    #[test]
    fn root_metacharacters_are_literal() {
        let temp = TempDir::new().unwrap();
        let odd = temp.path().join("build[v1]");
        touch(&odd.join("lang/en.toml"));

        let found = list_files(&[root(&odd)], "lang", "*.toml").unwrap();
        assert_eq!(found, vec![odd.join("lang/en.toml")]);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let err = list_files(&[], "config", "[").unwrap_err();
        assert!(matches!(err, CascadeError::InvalidPattern { .. }));
        assert!(list_files(&[], "config", "").is_err());
    }
}
