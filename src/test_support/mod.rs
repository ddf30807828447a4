//! Test utilities and mocks for wsbundle unit tests.
//!
//! The resolver reads installed modules through [`ModuleFs`], so most tests
//! lay out a workspace in a [`MockFileSystem`] instead of on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use wsbundle::test_support::{manifests, WorkspaceFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fs = WorkspaceFixture::new()
//!         .member("api", manifests::package("api", "1.0.0", &[("chalk", "^4")]))
//!         .module("chalk", manifests::package("chalk", "4.1.2", &[]))
//!         .to_mock("/ws");
//!
//!     // Resolve against `fs`...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::manifest::MANIFEST_NAME;
use crate::core::PackageManifest;
use crate::sources::ModuleFs;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock filesystem for testing without real I/O.
///
/// Provides an in-memory filesystem that can be used to test code that
/// reads module trees without touching the real filesystem.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: Vec<PathBuf>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        MockFileSystem {
            files: HashMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        // Ensure parent directories exist
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add a directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if !self.dirs.contains(&path) {
            // Add all parent directories too
            let mut current = path.clone();
            while let Some(parent) = current.parent() {
                if parent.as_os_str().is_empty() {
                    break;
                }
                if !self.dirs.contains(&parent.to_path_buf()) {
                    self.dirs.push(parent.to_path_buf());
                }
                current = parent.to_path_buf();
            }
            self.dirs.push(path);
        }
    }

    /// Read a file's contents.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("file not found: {}", path.display()))
    }

    /// Read a file as a string.
    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("invalid UTF-8: {}", e))
    }

    /// Check if a file or directory exists.
    pub fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(&path.to_path_buf())
    }

    /// Check if a path is a file.
    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Check if a directory exists.
    pub fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.contains(&path.to_path_buf())
    }

    /// List subdirectories in a directory.
    pub fn list_dirs(&self, path: &Path) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .cloned()
            .collect()
    }
}

impl ModuleFs for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.dir_exists(path)
    }

    fn read_manifest(&self, dir: &Path) -> Result<Option<PackageManifest>> {
        let path = dir.join(MANIFEST_NAME);
        if !self.is_file(&path) {
            return Ok(None);
        }
        let content = self.read_to_string(&path)?;
        PackageManifest::parse(&content).map(Some)
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    use std::path::Path;

    use crate::resolver::{Closure, ResolveOutcome};

    /// Assert that the closure holds exactly these `(specifier, source)` pairs,
    /// in any order.
    pub fn assert_closure(closure: &Closure, expected: &[(&str, &str)]) {
        let mut actual: Vec<(String, String)> = closure
            .iter()
            .map(|d| {
                (
                    d.specifier().to_string(),
                    d.source_directory().display().to_string(),
                )
            })
            .collect();
        actual.sort();

        let mut expected: Vec<(String, String)> = expected
            .iter()
            .map(|(s, p)| (s.to_string(), Path::new(p).display().to_string()))
            .collect();
        expected.sort();

        assert_eq!(actual, expected, "closure mismatch");
    }

    /// Assert that resolution produced no warnings.
    pub fn assert_no_warnings(outcome: &ResolveOutcome) {
        assert!(
            outcome.warnings().is_empty(),
            "expected no warnings, got: {:?}",
            outcome.warnings()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_filesystem_basic() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/package.json", r#"{ "name": "root" }"#);

        assert!(fs.exists(Path::new("/ws/package.json")));
        assert!(fs.is_file(Path::new("/ws/package.json")));
        assert!(fs.dir_exists(Path::new("/ws")));
        assert_eq!(
            fs.read_to_string(Path::new("/ws/package.json")).unwrap(),
            r#"{ "name": "root" }"#
        );
    }

    #[test]
    fn test_mock_filesystem_directories() {
        let mut fs = MockFileSystem::new();
        fs.add_dir("/ws/node_modules/@scope/util");

        assert!(fs.dir_exists(Path::new("/ws/node_modules/@scope")));
        assert_eq!(
            fs.list_dirs(Path::new("/ws/node_modules")),
            vec![PathBuf::from("/ws/node_modules/@scope")]
        );
        assert!(fs.exists(Path::new("/ws/node_modules/@scope/util")));
    }

    #[test]
    fn test_mock_module_fs() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/node_modules/chalk/package.json", r#"{ "name": "chalk" }"#);
        fs.add_dir("/ws/node_modules/bare");

        let dir = Path::new("/ws/node_modules/chalk");
        assert!(ModuleFs::is_dir(&fs, dir));
        let manifest = fs.read_manifest(dir).unwrap().unwrap();
        assert_eq!(manifest.name.as_deref(), Some("chalk"));

        assert!(fs
            .read_manifest(Path::new("/ws/node_modules/bare"))
            .unwrap()
            .is_none());
    }
}
