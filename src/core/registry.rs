//! Manifest registry - every workspace member, indexed by name.
//!
//! Built once per packaging run and read-only afterwards, so several
//! resolutions can share it.

use std::collections::HashMap;
use std::path::Path;

use crate::core::WorkspaceManifest;
use crate::sources::ModuleFs;

/// Workspace members indexed by package name.
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    members: HashMap<String, WorkspaceManifest>,
}

impl ManifestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ManifestRegistry {
            members: HashMap::new(),
        }
    }

    /// Load the manifests of the given member directories.
    ///
    /// Directories whose manifest is missing or unusable are not part of
    /// the installable workspace and are skipped.
    pub fn load<F, I, P>(fs: &F, package_dirs: I) -> Self
    where
        F: ModuleFs + ?Sized,
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut registry = ManifestRegistry::new();

        for dir in package_dirs {
            let dir = dir.as_ref();
            let manifest = match fs.read_manifest(dir) {
                Ok(Some(manifest)) => manifest,
                Ok(None) => {
                    tracing::debug!("skipping {}: no manifest", dir.display());
                    continue;
                }
                Err(e) => {
                    tracing::debug!("skipping {}: {:#}", dir.display(), e);
                    continue;
                }
            };

            match WorkspaceManifest::new(manifest, dir) {
                Ok(member) => registry.insert(member),
                Err(e) => tracing::debug!("skipping {}: {:#}", dir.display(), e),
            }
        }

        registry
    }

    /// Add a member. The first member registered under a name wins.
    pub fn insert(&mut self, member: WorkspaceManifest) {
        let name = member.name().as_str().to_string();
        if let Some(existing) = self.members.get(&name) {
            tracing::warn!(
                "workspace package `{}` is declared twice ({} and {}), using the first",
                name,
                existing.directory().display(),
                member.directory().display()
            );
            return;
        }
        self.members.insert(name, member);
    }

    /// Look up a member by package name.
    pub fn get(&self, name: &str) -> Option<&WorkspaceManifest> {
        self.members.get(name)
    }

    /// Check whether `name` is a workspace member.
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Find the member living in `dir`.
    pub fn by_directory(&self, dir: &Path) -> Option<&WorkspaceManifest> {
        self.members.values().find(|m| m.directory() == dir)
    }

    /// Iterate over members in name order.
    pub fn members(&self) -> impl Iterator<Item = &WorkspaceManifest> {
        let mut members: Vec<_> = self.members.values().collect();
        members.sort_by(|a, b| a.name().cmp(b.name()));
        members.into_iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
