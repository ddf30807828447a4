//! wsbundle - package one member of a JavaScript workspace into a
//! self-contained bundle.
//!
//! This crate provides the library behind the `wsbundle` CLI: workspace
//! discovery, dependency closure resolution, and bundle assembly.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for wsbundle unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory module filesystem and
/// workspace fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{ManifestRegistry, PackageManifest, PackageName, Workspace, WorkspaceManifest};
pub use resolver::{Closure, ResolveOutcome, ResolvedDependency, Resolver, SearchPath};
pub use util::context::GlobalContext;
