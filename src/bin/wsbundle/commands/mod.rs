//! Command implementations

pub mod completions;
pub mod list;
pub mod package;
pub mod tree;
pub mod why;

use std::path::Path;

use anyhow::Result;

use crate::cli::ResolveArgs;
use wsbundle::core::Workspace;
use wsbundle::ops::{PackageError, PackageResolution, ResolvePackageOptions};
use wsbundle::resolver::ResolveWarning;
use wsbundle::util::diagnostic::emit;
use wsbundle::util::{Config, GlobalContext};

/// Locate and load the workspace, along with its merged configuration.
pub fn load_workspace(ctx: &GlobalContext, root: Option<&Path>) -> Result<(Workspace, Config)> {
    let root = ctx.workspace_root(root)?;
    let ws = Workspace::load(&root)?;
    let config = ctx.load_config(ws.root());
    Ok((ws, config))
}

/// Resolution options: command-line flags over configuration.
pub fn resolve_options(
    ctx: &GlobalContext,
    args: &ResolveArgs,
    config: &Config,
) -> ResolvePackageOptions {
    let mut extra_search_paths = config.resolve.extra_search_paths.clone();
    extra_search_paths.extend(args.search_paths.iter().map(|p| ctx.cwd().join(p)));

    ResolvePackageOptions {
        include_optional: !args.no_optional && config.include_optional(),
        extra_search_paths,
    }
}

pub fn deny_warnings(args: &ResolveArgs, config: &Config) -> bool {
    args.deny_warnings || config.resolve.deny_warnings
}

/// Print resolution warnings to stderr.
pub fn report_warnings(ctx: &GlobalContext, warnings: &[ResolveWarning]) {
    for warning in warnings {
        emit(&warning.to_diagnostic(), ctx.color());
    }
}

/// Print a resolution's warnings, failing if they are denied.
pub fn check_resolution(
    ctx: &GlobalContext,
    resolution: &PackageResolution,
    deny: bool,
) -> Result<()> {
    let warnings = resolution.outcome.warnings();
    report_warnings(ctx, warnings);

    if deny && !warnings.is_empty() {
        return Err(PackageError::DeniedWarnings {
            package: resolution.target.name().to_string(),
            warnings: warnings.to_vec(),
        }
        .into());
    }
    Ok(())
}
