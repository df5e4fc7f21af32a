//! Persisted allow-list of content-indexed path prefixes.
//!
//! Files under one of these prefixes have their text content tokenized in
//! addition to their name. The list is stored as a JSON array of strings and
//! written back after every mutation. A missing or unreadable file loads as
//! an empty list.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ordered list of path prefixes whose files are content-indexed.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    file: PathBuf,
    prefixes: Vec<String>,
}

impl ContentPaths {
    /// Default file name inside the data directory.
    pub const FILE_NAME: &'static str = "indexed_paths.json";

    /// Load the list from `file`; missing or corrupt files give an empty list.
    pub fn load(file: impl AsRef<Path>) -> Self {
        let file = file.as_ref().to_path_buf();
        let prefixes = match fs::read_to_string(&file) {
            Ok(json) => match serde_json::from_str::<Vec<String>>(&json) {
                Ok(list) => list,
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Content path list is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                debug!(path = %file.display(), error = %e, "No content path list");
                Vec::new()
            }
        };
        ContentPaths { file, prefixes }
    }

    /// The prefixes, in insertion order.
    pub fn list(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Add a prefix. Returns false if an equal prefix (ignoring case) is
    /// already present. The list is persisted when it changes.
    pub fn add(&mut self, prefix: impl Into<String>) -> Result<bool> {
        let prefix = prefix.into();
        if prefix.is_empty() || self.position(&prefix).is_some() {
            return Ok(false);
        }
        info!(prefix = %prefix, "Adding content-indexed path");
        self.prefixes.push(prefix);
        self.save()?;
        Ok(true)
    }

    /// Remove a prefix (ignoring case). Returns false if it was not present.
    /// The list is persisted when it changes.
    pub fn remove(&mut self, prefix: &str) -> Result<bool> {
        match self.position(prefix) {
            Some(pos) => {
                let removed = self.prefixes.remove(pos);
                info!(prefix = %removed, "Removing content-indexed path");
                self.save()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// True if `path` starts with one of the prefixes (ignoring case).
    pub fn contains_path(&self, path: &str) -> bool {
        matches_prefix(path, &self.prefixes)
    }

    /// Write the list to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.prefixes)?;
        fs::write(&self.file, json)?;
        Ok(())
    }

    fn position(&self, prefix: &str) -> Option<usize> {
        let lower = prefix.to_lowercase();
        self.prefixes.iter().position(|p| p.to_lowercase() == lower)
    }
}

/// True if `path` starts with any of `prefixes`, ignoring case.
pub fn matches_prefix(path: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return false;
    }
    let path_lower = path.to_lowercase();
    prefixes
        .iter()
        .any(|p| path_lower.starts_with(&p.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_persists() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(ContentPaths::FILE_NAME);

        let mut paths = ContentPaths::load(&file);
        assert!(paths.is_empty());
        assert!(paths.add("/srv/Alpha").unwrap());
        assert!(!paths.add("/SRV/alpha").unwrap());

        let reloaded = ContentPaths::load(&file);
        assert_eq!(reloaded.list(), &["/srv/Alpha".to_string()]);
    }

    #[test]
    fn test_remove_persists() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(ContentPaths::FILE_NAME);

        let mut paths = ContentPaths::load(&file);
        paths.add("/a").unwrap();
        paths.add("/b").unwrap();
        assert!(paths.remove("/A").unwrap());
        assert!(!paths.remove("/missing").unwrap());

        let reloaded = ContentPaths::load(&file);
        assert_eq!(reloaded.list(), &["/b".to_string()]);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(ContentPaths::FILE_NAME);
        fs::write(&file, "{ not json").unwrap();

        assert!(ContentPaths::load(&file).is_empty());
    }

    #[test]
    fn test_narrower_prefix_is_already_covered() {
        let dir = TempDir::new().unwrap();
        let mut paths = ContentPaths::load(dir.path().join(ContentPaths::FILE_NAME));
        paths.add("/srv/Alpha").unwrap();

        assert!(paths.contains_path("/srv/alpha/Docs"));
        assert!(!paths.contains_path("/srv/Beta"));
        // Covered, but still a distinct entry.
        assert!(paths.add("/srv/alpha/Docs").unwrap());
        assert_eq!(paths.list().len(), 2);
    }

    #[test]
    fn test_matches_prefix_ignores_case() {
        let prefixes = vec!["/srv/Alpha/Docs".to_string()];
        assert!(matches_prefix("/srv/alpha/docs/readme.txt", &prefixes));
        assert!(!matches_prefix("/srv/beta/readme.txt", &prefixes));
        assert!(!matches_prefix("/srv/alpha/docs", &[]));
    }
}
