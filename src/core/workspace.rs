//! Workspace - the root manifest and its member packages.
//!
//! A workspace is a directory whose `package.json` declares a `workspaces`
//! field: glob patterns naming the directories of its member packages.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::core::manifest::{PackageManifest, WorkspacesField, MANIFEST_NAME, MODULES_DIR};
use crate::core::{ManifestRegistry, WorkspaceManifest};
use crate::resolver::SearchPath;
use crate::sources::DiskFs;

/// Fatal problems with the workspace configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceError {
    #[error("could not find a workspace root in {} or any parent directory", dir.display())]
    #[diagnostic(
        code(wsbundle::workspace::not_found),
        help("Run wsbundle from inside a workspace, or pass `--root <dir>`")
    )]
    NotFound { dir: PathBuf },

    #[error("could not read {}", path.display())]
    #[diagnostic(code(wsbundle::workspace::unreadable))]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}: {message}", path.display())]
    #[diagnostic(code(wsbundle::workspace::invalid_manifest))]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("you must specify a `workspaces` field in your workspace's package.json ({})", path.display())]
    #[diagnostic(
        code(wsbundle::workspace::missing_workspaces),
        help("Add `\"workspaces\": [\"packages/*\"]` to the root package.json")
    )]
    MissingWorkspaces { path: PathBuf },

    #[error(
        "the `workspaces` field in {} must either be an array or an object containing an array with the key `packages`",
        path.display()
    )]
    #[diagnostic(code(wsbundle::workspace::invalid_workspaces))]
    InvalidWorkspaces { path: PathBuf },

    #[error("invalid workspace pattern `{pattern}`: {message}")]
    #[diagnostic(code(wsbundle::workspace::invalid_glob))]
    InvalidGlob { pattern: String, message: String },

    #[error("package `{selector}` was not found in the workspace")]
    #[diagnostic(code(wsbundle::workspace::package_not_found))]
    PackageNotFound {
        selector: String,
        #[help]
        help: Option<String>,
    },

    #[error("`{selector}` matches more than one workspace package: {}", candidates.join(", "))]
    #[diagnostic(
        code(wsbundle::workspace::ambiguous),
        help("Select the package by its `name` instead")
    )]
    AmbiguousSelector {
        selector: String,
        candidates: Vec<String>,
    },

    #[error("workspace directory {} is not a valid package: {message}", path.display())]
    #[diagnostic(code(wsbundle::workspace::invalid_member))]
    InvalidMember { path: PathBuf, message: String },
}

/// A loaded workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root directory
    root: PathBuf,

    /// Root manifest
    manifest: PackageManifest,

    /// Member glob patterns
    patterns: Vec<String>,

    /// Directories matched by the patterns, sorted
    member_dirs: Vec<PathBuf>,

    /// Members with a valid manifest, by name
    registry: ManifestRegistry,
}

impl Workspace {
    /// Load the workspace rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, WorkspaceError> {
        let manifest_path = root.join(MANIFEST_NAME);
        let (manifest, patterns) = read_root_manifest(&manifest_path)?;

        let member_dirs = glob_members(root, &patterns)?;
        tracing::debug!(
            "workspace {} has {} member directories",
            root.display(),
            member_dirs.len()
        );

        let registry = ManifestRegistry::load(&DiskFs, &member_dirs);

        Ok(Workspace {
            root: root.to_path_buf(),
            manifest,
            patterns,
            member_dirs,
            registry,
        })
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the root manifest.
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Get the member glob patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Get every directory the patterns matched.
    pub fn member_dirs(&self) -> &[PathBuf] {
        &self.member_dirs
    }

    /// Get the manifest registry.
    pub fn registry(&self) -> &ManifestRegistry {
        &self.registry
    }

    /// Get the workspace root modules directory.
    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR)
    }

    /// Select a member by directory name or package name.
    ///
    /// A directory name is the last component of the member's path, so
    /// `api` selects `packages/api`.
    pub fn select(&self, selector: &str) -> Result<&WorkspaceManifest, WorkspaceError> {
        if let Some(member) = self.registry.get(selector) {
            return Ok(member);
        }

        let matches: Vec<&PathBuf> = self
            .member_dirs
            .iter()
            .filter(|dir| dir.file_name().is_some_and(|n| n == selector))
            .collect();

        match matches.as_slice() {
            [] => Err(WorkspaceError::PackageNotFound {
                selector: selector.to_string(),
                help: self.available_help(),
            }),
            [dir] => self.registry.by_directory(dir).ok_or_else(|| {
                WorkspaceError::InvalidMember {
                    path: dir.to_path_buf(),
                    message: member_problem(dir),
                }
            }),
            many => Err(WorkspaceError::AmbiguousSelector {
                selector: selector.to_string(),
                candidates: many
                    .iter()
                    .map(|d| crate::util::fs::relative_path(&self.root, d).display().to_string())
                    .collect(),
            }),
        }
    }

    /// The search path for a member: its own modules directory, the
    /// workspace root's, then any extra directories.
    pub fn search_path_for(&self, member: &WorkspaceManifest, extra: &[PathBuf]) -> SearchPath {
        SearchPath::for_package(member.directory(), &self.root)
            .with_extra(extra.iter().map(|p| self.root.join(p)))
    }

    fn available_help(&self) -> Option<String> {
        if self.registry.is_empty() {
            return Some(format!(
                "no workspace packages match {}",
                self.patterns.join(", ")
            ));
        }

        let names: Vec<String> = self
            .registry
            .members()
            .map(|m| {
                let dir = m.directory().file_name().map(|n| n.to_string_lossy());
                match dir {
                    Some(dir) if dir != m.name().as_str() => format!("{} ({})", m.name(), dir),
                    _ => m.name().to_string(),
                }
            })
            .collect();
        Some(format!("available packages: {}", names.join(", ")))
    }
}

/// Read the root manifest and extract its member patterns.
fn read_root_manifest(path: &Path) -> Result<(PackageManifest, Vec<String>), WorkspaceError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        WorkspaceError::ManifestUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let invalid = |message: String| WorkspaceError::ManifestInvalid {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let workspaces = match value.get("workspaces") {
        None | Some(Value::Null) => {
            return Err(WorkspaceError::MissingWorkspaces {
                path: path.to_path_buf(),
            })
        }
        Some(workspaces) => workspaces.clone(),
    };

    let patterns = serde_json::from_value::<WorkspacesField>(workspaces)
        .ok()
        .and_then(|w| w.patterns().map(<[String]>::to_vec))
        .ok_or_else(|| WorkspaceError::InvalidWorkspaces {
            path: path.to_path_buf(),
        })?;

    let manifest: PackageManifest =
        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

    Ok((manifest, patterns))
}

/// Expand member patterns into directories, relative to `root`.
///
/// Only directories match, and nothing inside a modules directory does.
fn glob_members(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, WorkspaceError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut dirs = Vec::new();

    for pattern in patterns {
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
        let full = format!("{}/{}", escaped_root, trimmed);

        let entries = glob::glob(&full).map_err(|e| WorkspaceError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    let relative = path.strip_prefix(root).unwrap_or(&path);
                    let in_modules = relative.components().any(|c| c.as_os_str() == MODULES_DIR);
                    if path.is_dir() && !in_modules {
                        dirs.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}

/// Explain why a member directory did not make it into the registry.
fn member_problem(dir: &Path) -> String {
    let path = dir.join(MANIFEST_NAME);
    if !path.is_file() {
        return format!("it has no {}", MANIFEST_NAME);
    }
    match PackageManifest::load(&path) {
        Ok(manifest) => match WorkspaceManifest::new(manifest, dir) {
            Ok(_) => "its package name is declared by another workspace package".to_string(),
            Err(e) => format!("{:#}", e),
        },
        Err(e) => format!("{:#}", e),
    }
}

/// Find the workspace root: the nearest ancestor of `start` (inclusive)
/// whose `package.json` declares `workspaces`.
pub fn find_workspace_root(start: &Path) -> Result<PathBuf, WorkspaceError> {
    for dir in start.ancestors() {
        let path = dir.join(MANIFEST_NAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        match serde_json::from_str::<Value>(content) {
            Ok(value) if value.get("workspaces").is_some() => return Ok(dir.to_path_buf()),
            Ok(_) => {}
            Err(e) => tracing::debug!("ignoring {}: {}", path.display(), e),
        }
    }

    Err(WorkspaceError::NotFound {
        dir: start.to_path_buf(),
    })
}
