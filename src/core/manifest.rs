//! `package.json` manifest parsing.
//!
//! Only the fields the bundler needs are modelled; everything else in the
//! file is ignored.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Manifest file name.
pub const MANIFEST_NAME: &str = "package.json";

/// Name of the directory modules are installed into.
pub const MODULES_DIR: &str = "node_modules";

/// The `workspaces` field of a root manifest.
///
/// Both the array form (`"workspaces": ["packages/*"]`) and the object form
/// (`"workspaces": { "packages": ["packages/*"] }`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    Patterns(Vec<String>),
    Detailed {
        #[serde(default)]
        packages: Option<Vec<String>>,
        #[serde(default)]
        nohoist: Vec<String>,
    },
}

impl WorkspacesField {
    /// Member glob patterns, or `None` if the object form lacks `packages`.
    pub fn patterns(&self) -> Option<&[String]> {
        match self {
            WorkspacesField::Patterns(patterns) => Some(patterns),
            WorkspacesField::Detailed { packages, .. } => packages.as_deref(),
        }
    }
}

/// A parsed `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name (absent for some private roots)
    #[serde(default)]
    pub name: Option<String>,

    /// Package version
    #[serde(default)]
    pub version: Option<String>,

    /// Whether the package is private
    #[serde(default)]
    pub private: bool,

    /// Runtime dependencies (name -> range)
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Optional runtime dependencies (name -> range)
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,

    /// Lifecycle and user scripts
    #[serde(default)]
    pub scripts: IndexMap<String, String>,

    /// Workspace configuration (root manifest only)
    #[serde(default)]
    pub workspaces: Option<WorkspacesField>,
}

impl PackageManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest content.
    pub fn parse(content: &str) -> Result<Self> {
        // Some editors write a byte order mark.
        let content = content.trim_start_matches('\u{feff}');
        serde_json::from_str(content).context("invalid package.json")
    }

    /// Check whether a script with the given name exists.
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Dependencies to follow at runtime in declared order, optionally
    /// followed by the optional dependencies. Each item is `(name, range, optional)`.
    ///
    /// A name listed in both maps is treated as optional, which is how the
    /// installer treats it.
    pub fn runtime_dependencies(&self, include_optional: bool) -> Vec<(&str, &str, bool)> {
        let mut deps: Vec<(&str, &str, bool)> = self
            .dependencies
            .iter()
            .filter(|(name, _)| !self.optional_dependencies.contains_key(*name))
            .map(|(name, range)| (name.as_str(), range.as_str(), false))
            .collect();

        if include_optional {
            deps.extend(
                self.optional_dependencies
                    .iter()
                    .map(|(name, range)| (name.as_str(), range.as_str(), true)),
            );
        }

        deps
    }
}
