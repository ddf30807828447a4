//! Disk-backed module access.

use std::path::Path;

use anyhow::Result;

use crate::core::manifest::MANIFEST_NAME;
use crate::core::PackageManifest;
use crate::sources::ModuleFs;

/// [`ModuleFs`] over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl DiskFs {
    /// Create a new disk filesystem view.
    pub fn new() -> Self {
        DiskFs
    }
}

impl ModuleFs for DiskFs {
    fn is_dir(&self, path: &Path) -> bool {
        // `Path::is_dir` follows symlinks, so linked workspace packages count.
        path.is_dir()
    }

    fn read_manifest(&self, dir: &Path) -> Result<Option<PackageManifest>> {
        let path = dir.join(MANIFEST_NAME);
        if !path.is_file() {
            return Ok(None);
        }

        PackageManifest::load(&path).map(Some)
    }
}
