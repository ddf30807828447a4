//! `wsbundle why` command

use std::path::Path;

use anyhow::{bail, Result};

use super::{check_resolution, deny_warnings, load_workspace, resolve_options};
use crate::cli::WhyArgs;
use wsbundle::ops::resolve_package;
use wsbundle::resolver::NodeKind;
use wsbundle::util::GlobalContext;

/// Chains printed per matching module.
const MAX_CHAINS: usize = 8;

pub fn execute(args: WhyArgs, ctx: &GlobalContext, root: Option<&Path>) -> Result<()> {
    let (ws, config) = load_workspace(ctx, root)?;
    let opts = resolve_options(ctx, &args.resolve, &config);

    let resolution = resolve_package(&ws, &args.selector, &opts)?;
    let graph = resolution.outcome.graph();

    let matches: Vec<_> = graph
        .find(&args.dependency)
        .into_iter()
        .filter(|&n| graph.node(n).kind != NodeKind::Root)
        .collect();
    if matches.is_empty() {
        bail!(
            "`{}` is not a dependency of `{}`",
            args.dependency,
            resolution.target.name()
        );
    }

    for (i, node) in matches.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let info = graph.node(*node);
        match &info.directory {
            Some(dir) => println!("{} ({})", info.label, dir.display()),
            None => println!("{}", info.label),
        }

        let chains = graph.chains_to(*node, MAX_CHAINS);
        for chain in &chains {
            let labels: Vec<&str> = chain.iter().map(|n| graph.node(*n).label.as_str()).collect();
            println!("  {}", labels.join(" -> "));
        }
        if chains.len() == MAX_CHAINS {
            println!("  ...");
        }
    }

    check_resolution(ctx, &resolution, deny_warnings(&args.resolve, &config))
}
