//! ModuleFs trait - the filesystem view the resolver works against.

use std::path::Path;

use anyhow::Result;

use crate::core::PackageManifest;

/// Read-only access to installed modules.
///
/// The resolver only ever asks two questions of the filesystem, so tests can
/// answer them from memory instead of laying out real `node_modules` trees.
pub trait ModuleFs {
    /// Check whether `path` is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Read the manifest of the package in `dir`.
    ///
    /// Returns `Ok(None)` when the directory has no manifest, and an error
    /// when one exists but cannot be read or parsed.
    fn read_manifest(&self, dir: &Path) -> Result<Option<PackageManifest>>;
}

impl<T: ModuleFs + ?Sized> ModuleFs for &T {
    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn read_manifest(&self, dir: &Path) -> Result<Option<PackageManifest>> {
        (**self).read_manifest(dir)
    }
}
