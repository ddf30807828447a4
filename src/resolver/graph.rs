//! Dependency graph recorded during resolution.
//!
//! The closure says *what* gets bundled; the graph says *why*. It is used by
//! `wsbundle tree` and `wsbundle why`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::resolver::specifier::parse_specifier;

/// Kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The package being bundled
    Root,
    /// A workspace member
    Local,
    /// An installed external module
    External,
}

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Display label (package name, or specifier for external modules)
    pub label: String,
    /// Node kind
    pub kind: NodeKind,
    /// Directory the package lives in, when known
    pub directory: Option<PathBuf>,
}

impl GraphNode {
    /// Create a node.
    pub fn new(label: impl Into<String>, kind: NodeKind, directory: Option<&Path>) -> Self {
        GraphNode {
            label: label.into(),
            kind,
            directory: directory.map(Path::to_path_buf),
        }
    }

    /// The package name of this node, without any version suffix.
    pub fn name(&self) -> &str {
        parse_specifier(&self.label).0
    }
}

/// Who-requires-what graph rooted at the bundled package.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// Create a graph with a root node.
    pub fn new(root_label: impl Into<String>, root_dir: Option<&Path>) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::new(root_label, NodeKind::Root, root_dir));
        DependencyGraph { graph, root }
    }

    /// Get the root node.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add a node.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Add a dependency edge. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Change a node's label.
    pub fn relabel(&mut self, node: NodeIndex, label: impl Into<String>) {
        if let Some(weight) = self.graph.node_weight_mut(node) {
            weight.label = label.into();
        }
    }

    /// Get a node.
    pub fn node(&self, node: NodeIndex) -> &GraphNode {
        &self.graph[node]
    }

    /// Direct dependencies of a node, sorted by label.
    pub fn deps(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<_> = self.graph.neighbors(node).collect();
        deps.sort_by(|a, b| self.graph[*a].label.cmp(&self.graph[*b].label));
        deps
    }

    /// Nodes that depend on the given node, sorted by label.
    pub fn dependents(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<_> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        deps.sort_by(|a, b| self.graph[*a].label.cmp(&self.graph[*b].label));
        deps
    }

    /// Find nodes whose label or package name equals `query`.
    pub fn find(&self, query: &str) -> Vec<NodeIndex> {
        let mut found: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&n| {
                let node = &self.graph[n];
                node.label == query || node.name() == query
            })
            .collect();
        found.sort_by(|a, b| self.graph[*a].label.cmp(&self.graph[*b].label));
        found
    }

    /// Dependency chains from the root to `target`, at most `limit` of them.
    ///
    /// Each chain starts with the root and ends with `target`.
    pub fn chains_to(&self, target: NodeIndex, limit: usize) -> Vec<Vec<NodeIndex>> {
        let mut chains = Vec::new();
        let mut path = vec![target];
        let mut on_path = HashSet::from([target]);
        self.walk_up(target, &mut path, &mut on_path, &mut chains, limit);
        chains
    }

    fn walk_up(
        &self,
        node: NodeIndex,
        path: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        chains: &mut Vec<Vec<NodeIndex>>,
        limit: usize,
    ) {
        if chains.len() >= limit {
            return;
        }
        if node == self.root {
            chains.push(path.iter().rev().copied().collect());
            return;
        }

        for parent in self.dependents(node) {
            if !on_path.insert(parent) {
                continue;
            }
            path.push(parent);
            self.walk_up(parent, path, on_path, chains, limit);
            path.pop();
            on_path.remove(&parent);
        }
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// A graph always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DependencyGraph, NodeIndex, NodeIndex, NodeIndex) {
        let mut graph = DependencyGraph::new("api", None);
        let lib = graph.add_node(GraphNode::new("lib", NodeKind::Local, None));
        let chalk = graph.add_node(GraphNode::new(
            "chalk",
            NodeKind::External,
            Some(Path::new("/ws/node_modules/chalk")),
        ));
        let root = graph.root();
        graph.add_edge(root, lib);
        graph.add_edge(root, chalk);
        graph.add_edge(lib, chalk);
        graph.add_edge(lib, chalk);
        (graph, lib, chalk, root)
    }

    #[test]
    fn test_edges_and_neighbors() {
        let (graph, lib, chalk, root) = sample();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.deps(root), vec![chalk, lib]);
        assert_eq!(graph.dependents(chalk), vec![graph.root(), lib]);
    }

    #[test]
    fn test_chains_to() {
        let (graph, lib, chalk, root) = sample();
        let mut chains = graph.chains_to(chalk, 10);
        chains.sort();
        assert_eq!(chains.len(), 2);
        assert!(chains.contains(&vec![root, chalk]));
        assert!(chains.contains(&vec![root, lib, chalk]));

        assert_eq!(graph.chains_to(chalk, 1).len(), 1);
    }

    #[test]
    fn test_chains_survive_cycles() {
        let mut graph = DependencyGraph::new("a", None);
        let b = graph.add_node(GraphNode::new("b", NodeKind::Local, None));
        let root = graph.root();
        graph.add_edge(root, b);
        graph.add_edge(b, root);

        assert_eq!(graph.chains_to(b, 10), vec![vec![root, b]]);
    }

    #[test]
    fn test_find_by_name_or_specifier() {
        let mut graph = DependencyGraph::new("api", None);
        let old = graph.add_node(GraphNode::new("lodash@4.17.0", NodeKind::External, None));
        let new = graph.add_node(GraphNode::new("lodash@4.17.21", NodeKind::External, None));

        assert_eq!(graph.find("lodash"), vec![old, new]);
        assert_eq!(graph.find("lodash@4.17.21"), vec![new]);
        assert!(graph.find("chalk").is_empty());
    }

    #[test]
    fn test_relabel() {
        let (mut graph, _, chalk, _) = sample();
        graph.relabel(chalk, "chalk@4.1.2");
        assert_eq!(graph.node(chalk).label, "chalk@4.1.2");
        assert_eq!(graph.node(chalk).name(), "chalk");
    }
}
