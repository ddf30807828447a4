//! Closure - the external dependencies a package needs at runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::PackageName;

/// One external module to copy into the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    specifier: String,
    name: PackageName,
    version: Option<String>,
    source_directory: PathBuf,
    install_path: PathBuf,
    depth: usize,
}

impl ResolvedDependency {
    /// Create a resolved dependency.
    pub fn new(
        specifier: impl Into<String>,
        name: PackageName,
        version: Option<String>,
        source_directory: impl Into<PathBuf>,
        install_path: impl Into<PathBuf>,
        depth: usize,
    ) -> Self {
        ResolvedDependency {
            specifier: specifier.into(),
            name,
            version,
            source_directory: source_directory.into(),
            install_path: install_path.into(),
            depth,
        }
    }

    /// The disambiguated identity of this dependency.
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// The package name.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The installed version, if the module declares one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Directory to copy from.
    pub fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    /// Location below the bundle's `node_modules`, mirroring the installer's
    /// layout.
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    /// Distance from the target package (0 for its direct dependencies).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Deduplicated set of resolved dependencies, unique by specifier.
///
/// Iteration follows discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    entries: Vec<ResolvedDependency>,
    by_specifier: HashMap<String, usize>,
}

impl Closure {
    /// Create an empty closure.
    pub fn new() -> Self {
        Closure {
            entries: Vec::new(),
            by_specifier: HashMap::new(),
        }
    }

    /// Insert a dependency. Returns `false` if its specifier is already present.
    pub fn insert(&mut self, dep: ResolvedDependency) -> bool {
        if self.by_specifier.contains_key(dep.specifier()) {
            return false;
        }
        self.by_specifier
            .insert(dep.specifier().to_string(), self.entries.len());
        self.entries.push(dep);
        true
    }

    /// Look up a dependency by specifier.
    pub fn get(&self, specifier: &str) -> Option<&ResolvedDependency> {
        self.by_specifier.get(specifier).map(|&i| &self.entries[i])
    }

    /// Check whether a specifier is present.
    pub fn contains(&self, specifier: &str) -> bool {
        self.by_specifier.contains_key(specifier)
    }

    /// All entries for a package name.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResolvedDependency> + 'a {
        self.entries.iter().filter(move |d| d.name().as_str() == name)
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedDependency> {
        self.entries.iter()
    }

    /// Specifiers in discovery order.
    pub fn specifiers(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.specifier()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into a list.
    pub fn into_vec(self) -> Vec<ResolvedDependency> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Closure {
    type Item = &'a ResolvedDependency;
    type IntoIter = std::slice::Iter<'a, ResolvedDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
