//! Core data structures for wsbundle.
//!
//! This module contains the foundational types used throughout wsbundle:
//! - Validated package names
//! - `package.json` manifests and workspace members
//! - The manifest registry and workspace discovery

pub mod manifest;
pub mod package;
pub mod package_name;
pub mod registry;
pub mod workspace;

pub use manifest::{PackageManifest, WorkspacesField, MANIFEST_NAME, MODULES_DIR};
pub use package::WorkspaceManifest;
pub use package_name::{PackageName, PackageNameError};
pub use registry::ManifestRegistry;
pub use workspace::{find_workspace_root, Workspace, WorkspaceError};
