//! Test fixtures for workspace layouts.
//!
//! A [`WorkspaceFixture`] describes a workspace (root manifest, members,
//! installed modules) with paths relative to the workspace root, and can be
//! materialized either in a [`MockFileSystem`](super::MockFileSystem) or on
//! disk.

use std::path::{Path, PathBuf};

/// Fixture for a workspace with members and installed modules.
#[derive(Debug, Clone)]
pub struct WorkspaceFixture {
    /// Root package.json content.
    pub root_manifest: String,
    /// Files to create (path relative to the workspace root -> content).
    pub files: Vec<(PathBuf, String)>,
    /// Empty directories to create (relative to the workspace root).
    pub dirs: Vec<PathBuf>,
}

impl WorkspaceFixture {
    /// Create a workspace whose members live under `packages/*`.
    pub fn new() -> Self {
        WorkspaceFixture {
            root_manifest: manifests::workspace_root(&["packages/*"]),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Replace the root manifest.
    pub fn with_root_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.root_manifest = manifest.into();
        self
    }

    /// Add a member at `packages/<dir>`.
    pub fn member(self, dir: &str, manifest: impl Into<String>) -> Self {
        self.file(Path::new("packages").join(dir).join("package.json"), manifest)
    }

    /// Add a module hoisted to the workspace root `node_modules`.
    pub fn module(self, name: &str, manifest: impl Into<String>) -> Self {
        self.module_at(Path::new("node_modules").join(name), manifest)
    }

    /// Add a module at an arbitrary directory relative to the root.
    pub fn module_at(self, dir: impl AsRef<Path>, manifest: impl Into<String>) -> Self {
        self.file(dir.as_ref().join("package.json"), manifest)
    }

    /// Add a module directory without a manifest.
    pub fn bare_module_at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    /// Add an arbitrary file.
    pub fn file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Materialize the fixture in a mock filesystem rooted at `root`.
    pub fn to_mock(&self, root: impl AsRef<Path>) -> super::MockFileSystem {
        let root = root.as_ref();
        let mut fs = super::MockFileSystem::new();

        fs.add_file(root.join("package.json"), self.root_manifest.as_bytes());
        for (rel_path, content) in &self.files {
            fs.add_file(root.join(rel_path), content.as_bytes());
        }
        for dir in &self.dirs {
            fs.add_dir(root.join(dir));
        }

        fs
    }

    /// Write the fixture to a real directory.
    pub fn write_to(&self, root: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(root)?;
        std::fs::write(root.join("package.json"), &self.root_manifest)?;

        for (rel_path, content) in &self.files {
            let full_path = root.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }
        for dir in &self.dirs {
            std::fs::create_dir_all(root.join(dir))?;
        }

        Ok(())
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Common manifest templates.
pub mod manifests {
    /// A root manifest declaring workspace patterns (array form).
    pub fn workspace_root(patterns: &[&str]) -> String {
        let patterns: Vec<String> = patterns.iter().map(|p| format!("\"{}\"", p)).collect();
        format!(
            r#"{{ "name": "root", "private": true, "workspaces": [{}] }}"#,
            patterns.join(", ")
        )
    }

    /// A package manifest with runtime dependencies.
    pub fn package(name: &str, version: &str, deps: &[(&str, &str)]) -> String {
        let deps: Vec<String> = deps
            .iter()
            .map(|(n, r)| format!("\"{}\": \"{}\"", n, r))
            .collect();
        format!(
            r#"{{ "name": "{}", "version": "{}", "dependencies": {{ {} }} }}"#,
            name,
            version,
            deps.join(", ")
        )
    }

    /// A package manifest with a build script.
    pub fn package_with_build(name: &str, version: &str, deps: &[(&str, &str)], build: &str) -> String {
        let deps: Vec<String> = deps
            .iter()
            .map(|(n, r)| format!("\"{}\": \"{}\"", n, r))
            .collect();
        format!(
            r#"{{ "name": "{}", "version": "{}", "dependencies": {{ {} }}, "scripts": {{ "build": "{}" }} }}"#,
            name,
            version,
            deps.join(", "),
            build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PackageManifest;
    use crate::sources::ModuleFs;

    #[test]
    fn test_manifest_templates_parse() {
        let root = PackageManifest::parse(&manifests::workspace_root(&["apps/*", "libs/*"])).unwrap();
        assert_eq!(root.workspaces.unwrap().patterns().map(|p| p.len()), Some(2));

        let pkg = PackageManifest::parse(&manifests::package("a", "1.0.0", &[("b", "^2")])).unwrap();
        assert_eq!(pkg.dependencies.get("b").map(String::as_str), Some("^2"));

        let empty = PackageManifest::parse(&manifests::package("a", "1.0.0", &[])).unwrap();
        assert!(empty.dependencies.is_empty());

        let built = PackageManifest::parse(&manifests::package_with_build("a", "1.0.0", &[], "tsc")).unwrap();
        assert!(built.has_script("build"));
    }

    #[test]
    fn test_fixture_to_mock() {
        let fs = WorkspaceFixture::new()
            .member("api", manifests::package("api", "1.0.0", &[]))
            .module("@scope/util", manifests::package("@scope/util", "1.0.0", &[]))
            .bare_module_at("node_modules/bare")
            .to_mock("/ws");

        assert!(fs.is_dir(Path::new("/ws/packages/api")));
        assert!(fs.is_dir(Path::new("/ws/node_modules/@scope/util")));
        assert!(fs.is_dir(Path::new("/ws/node_modules/bare")));
        assert!(fs.read_manifest(Path::new("/ws")).unwrap().is_some());
    }

    #[test]
    fn test_fixture_write_to_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        WorkspaceFixture::new()
            .member("api", manifests::package("api", "1.0.0", &[]))
            .write_to(tmp.path())
            .unwrap();

        assert!(tmp.path().join("package.json").is_file());
        assert!(tmp.path().join("packages/api/package.json").is_file());
    }
}
