//! `wsbundle list` command

use std::path::Path;

use anyhow::{Context, Result};

use super::{check_resolution, deny_warnings, load_workspace, resolve_options};
use crate::cli::ListArgs;
use wsbundle::ops::resolve_package;
use wsbundle::util::fs::relative_path;
use wsbundle::util::GlobalContext;
use wsbundle::ResolvedDependency;

pub fn execute(args: ListArgs, ctx: &GlobalContext, root: Option<&Path>) -> Result<()> {
    let (ws, config) = load_workspace(ctx, root)?;
    let opts = resolve_options(ctx, &args.resolve, &config);

    let resolution = resolve_package(&ws, &args.selector, &opts)?;
    let closure = resolution.outcome.closure();

    if args.json {
        let entries: Vec<&ResolvedDependency> = closure.iter().collect();
        let json =
            serde_json::to_string_pretty(&entries).context("failed to serialize the closure")?;
        println!("{}", json);
    } else {
        let width = closure
            .iter()
            .map(|d| d.specifier().len())
            .max()
            .unwrap_or(0);
        for dep in closure {
            println!(
                "{:<width$}  {}",
                dep.specifier(),
                relative_path(ws.root(), dep.source_directory()).display(),
                width = width
            );
        }
    }

    check_resolution(ctx, &resolution, deny_warnings(&args.resolve, &config))
}
