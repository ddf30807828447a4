//! `wsbundle tree` command

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use petgraph::graph::NodeIndex;

use super::{check_resolution, deny_warnings, load_workspace, resolve_options};
use crate::cli::TreeArgs;
use wsbundle::ops::resolve_package;
use wsbundle::resolver::{DependencyGraph, NodeKind};
use wsbundle::util::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext, root: Option<&Path>) -> Result<()> {
    let (ws, config) = load_workspace(ctx, root)?;
    let opts = resolve_options(ctx, &args.resolve, &config);

    let resolution = resolve_package(&ws, &args.selector, &opts)?;
    let graph = resolution.outcome.graph();

    let mut lines = Vec::new();
    let mut seen = HashSet::new();
    render(
        graph,
        graph.root(),
        "",
        0,
        args.depth.unwrap_or(usize::MAX),
        &mut seen,
        &mut lines,
    );
    for line in lines {
        println!("{}", line);
    }

    check_resolution(ctx, &resolution, deny_warnings(&args.resolve, &config))
}

/// Render the subtree below `node`. Nodes already printed are marked `(*)`
/// and not expanded again.
fn render(
    graph: &DependencyGraph,
    node: NodeIndex,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<NodeIndex>,
    lines: &mut Vec<String>,
) {
    if depth == 0 {
        lines.push(label(graph, node, false));
    }
    if !seen.insert(node) || depth >= max_depth {
        return;
    }

    let deps = graph.deps(node);
    for (i, dep) in deps.iter().enumerate() {
        let last = i + 1 == deps.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        let repeated = seen.contains(dep);
        lines.push(format!("{}{}{}", prefix, branch, label(graph, *dep, repeated)));
        if !repeated {
            render(
                graph,
                *dep,
                &format!("{}{}", prefix, indent),
                depth + 1,
                max_depth,
                seen,
                lines,
            );
        }
    }
}

fn label(graph: &DependencyGraph, node: NodeIndex, repeated: bool) -> String {
    let node = graph.node(node);
    let kind = match node.kind {
        NodeKind::Local => " (workspace)",
        NodeKind::Root | NodeKind::External => "",
    };
    let marker = if repeated { " (*)" } else { "" };
    format!("{}{}{}", node.label, kind, marker)
}
