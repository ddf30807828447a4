//! WorkspaceManifest - a workspace member's manifest and location.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use indexmap::IndexMap;

use crate::core::{PackageManifest, PackageName};

/// A workspace member: its validated name, manifest and directory.
///
/// Immutable after load. Identity is the package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceManifest {
    name: PackageName,
    manifest: PackageManifest,
    directory: PathBuf,
}

impl WorkspaceManifest {
    /// Create a member from a parsed manifest.
    ///
    /// Fails when the manifest has no name or an invalid one; such a
    /// directory cannot be depended on by name.
    pub fn new(manifest: PackageManifest, directory: impl Into<PathBuf>) -> Result<Self> {
        let raw = manifest
            .name
            .as_deref()
            .ok_or_else(|| anyhow!("manifest has no `name` field"))?;
        let name = PackageName::new(raw)?;

        Ok(WorkspaceManifest {
            name,
            manifest,
            directory: directory.into(),
        })
    }

    /// Get the package name.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// Get the declared version, if any.
    pub fn version(&self) -> Option<&str> {
        self.manifest.version.as_deref()
    }

    /// Get the declared runtime dependencies (name -> range).
    pub fn dependencies(&self) -> &IndexMap<String, String> {
        &self.manifest.dependencies
    }

    /// Get the full manifest.
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Get the member's directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_from_manifest() {
        let manifest =
            PackageManifest::parse(r#"{ "name": "@acme/api", "version": "1.0.0", "dependencies": { "chalk": "^4" } }"#)
                .unwrap();
        let member = WorkspaceManifest::new(manifest, "/ws/packages/api").unwrap();

        assert_eq!(member.name().as_str(), "@acme/api");
        assert_eq!(member.version(), Some("1.0.0"));
        assert_eq!(member.dependencies().len(), 1);
        assert_eq!(member.directory(), Path::new("/ws/packages/api"));
    }

    #[test]
    fn test_member_requires_name() {
        let manifest = PackageManifest::parse(r#"{ "version": "1.0.0" }"#).unwrap();
        assert!(WorkspaceManifest::new(manifest, "/ws/scratch").is_err());
    }
}
