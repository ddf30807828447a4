//! Package resolution operations.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::{Workspace, WorkspaceManifest};
use crate::resolver::{ResolveOptions, ResolveOutcome, Resolver, SearchPath};
use crate::sources::DiskFs;

/// Options for resolving a workspace package.
#[derive(Debug, Clone)]
pub struct ResolvePackageOptions {
    /// Follow optionalDependencies
    pub include_optional: bool,

    /// Extra modules directories searched after the workspace root,
    /// relative to the workspace root
    pub extra_search_paths: Vec<PathBuf>,
}

impl Default for ResolvePackageOptions {
    fn default() -> Self {
        ResolvePackageOptions {
            include_optional: true,
            extra_search_paths: Vec::new(),
        }
    }
}

/// A resolved workspace package.
#[derive(Debug, Clone)]
pub struct PackageResolution {
    /// The selected package
    pub target: WorkspaceManifest,

    /// The search path it was resolved against
    pub search_path: SearchPath,

    /// The closure, warnings and graph
    pub outcome: ResolveOutcome,
}

/// Select a workspace package and resolve its dependency closure.
pub fn resolve_package(
    ws: &Workspace,
    selector: &str,
    opts: &ResolvePackageOptions,
) -> Result<PackageResolution> {
    let target = ws.select(selector)?;
    Ok(resolve_member(ws, target, opts))
}

/// Resolve the dependency closure of an already selected member.
pub fn resolve_member(
    ws: &Workspace,
    target: &WorkspaceManifest,
    opts: &ResolvePackageOptions,
) -> PackageResolution {
    let search_path = ws.search_path_for(target, &opts.extra_search_paths);
    tracing::debug!("resolving `{}` against {}", target.name(), search_path);

    let outcome = Resolver::new(&DiskFs, ws.registry())
        .with_options(ResolveOptions {
            include_optional: opts.include_optional,
        })
        .resolve_package(target, &search_path);

    tracing::debug!(
        "`{}` needs {} external module(s), {} warning(s)",
        target.name(),
        outcome.closure().len(),
        outcome.warnings().len()
    );

    PackageResolution {
        target: target.clone(),
        search_path,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{manifests, WorkspaceFixture};
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        WorkspaceFixture::new()
            .member("api", manifests::package("api", "1.0.0", &[("lib", "*"), ("left-pad", "^1.0.0")]))
            .member("lib", manifests::package("lib", "1.0.0", &[("chalk", "^4")]))
            .module("left-pad", manifests::package("left-pad", "1.3.0", &[]))
            .module("chalk", manifests::package("chalk", "4.1.2", &[]))
            .module_at("vendor/extra", manifests::package("extra", "1.0.0", &[]))
            .write_to(tmp.path())
            .unwrap();
        let ws = Workspace::load(tmp.path()).unwrap();
        (tmp, ws)
    }

    #[test]
    fn test_resolve_package_on_disk() {
        let (tmp, ws) = workspace();
        let resolution = resolve_package(&ws, "api", &ResolvePackageOptions::default()).unwrap();

        assert_eq!(resolution.target.name().as_str(), "api");
        assert_eq!(resolution.search_path.len(), 2);

        let closure = resolution.outcome.closure();
        let mut specifiers = closure.specifiers();
        specifiers.sort();
        assert_eq!(specifiers, vec!["chalk", "left-pad"]);
        assert_eq!(
            closure.get("chalk").unwrap().source_directory(),
            tmp.path().join("node_modules").join("chalk")
        );
        assert!(!resolution.outcome.has_warnings());
    }

    #[test]
    fn test_extra_search_paths() {
        let tmp = TempDir::new().unwrap();
        WorkspaceFixture::new()
            .member("api", manifests::package("api", "1.0.0", &[("extra", "*")]))
            .module_at("vendor/extra", manifests::package("extra", "1.0.0", &[]))
            .write_to(tmp.path())
            .unwrap();
        let ws = Workspace::load(tmp.path()).unwrap();

        let without = resolve_package(&ws, "api", &ResolvePackageOptions::default()).unwrap();
        assert!(without.outcome.closure().is_empty());
        assert!(without.outcome.has_warnings());

        let opts = ResolvePackageOptions {
            extra_search_paths: vec![PathBuf::from("vendor")],
            ..Default::default()
        };
        let with = resolve_package(&ws, "api", &opts).unwrap();
        assert_eq!(with.outcome.closure().specifiers(), vec!["extra"]);
    }

    #[test]
    fn test_unknown_package() {
        let (_tmp, ws) = workspace();
        let err = resolve_package(&ws, "web", &ResolvePackageOptions::default()).unwrap_err();
        assert!(err.to_string().contains("`web` was not found"));
    }
}
