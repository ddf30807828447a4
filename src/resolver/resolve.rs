//! Closure resolution - which installed modules a package needs.
//!
//! Starting from a package's direct dependencies, every name is classified
//! once as a workspace member (followed, never bundled) or an external
//! module (located on the search path, bundled, and followed through its own
//! manifest). Traversal is depth-first over an explicit worklist and visits
//! each member and each `(name, directory)` pair at most once, so cycles
//! terminate.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use petgraph::graph::NodeIndex;

use crate::core::{ManifestRegistry, PackageName, WorkspaceManifest};
use crate::resolver::closure::{Closure, ResolvedDependency};
use crate::resolver::errors::ResolveWarning;
use crate::resolver::graph::{DependencyGraph, GraphNode, NodeKind};
use crate::resolver::search_path::{Found, SearchPath};
use crate::resolver::specifier::format_specifier;
use crate::sources::ModuleFs;

/// Label of the root node when resolving bare dependency names.
pub const ROOT_LABEL: &str = "<root>";

/// Resolution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Follow `optionalDependencies` of members and installed modules
    pub include_optional: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            include_optional: true,
        }
    }
}

/// Result of a resolution: the closure plus everything that went wrong
/// along the way.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    closure: Closure,
    warnings: Vec<ResolveWarning>,
    graph: DependencyGraph,
}

impl ResolveOutcome {
    /// The resolved closure.
    pub fn closure(&self) -> &Closure {
        &self.closure
    }

    /// Non-fatal problems, in the order they were found.
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    /// Check whether any warnings were recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Split into closure, warnings and graph.
    pub fn into_parts(self) -> (Closure, Vec<ResolveWarning>, DependencyGraph) {
        (self.closure, self.warnings, self.graph)
    }
}

/// How a dependency name is satisfied.
enum Classification<'r> {
    /// A workspace member, linked into place by the workspace itself.
    Local(&'r WorkspaceManifest),
    /// An installed module on the search path.
    External(Found),
    /// Not installed anywhere on the search path.
    Missing,
}

/// A pending dependency edge.
struct WorkItem {
    name: String,
    search: Rc<SearchPath>,
    parent: NodeIndex,
    required_by: Rc<str>,
    optional: bool,
    depth: usize,
}

/// An external module reached during traversal.
struct Module {
    name: PackageName,
    version: Option<String>,
    directory: PathBuf,
    install_path: PathBuf,
    depth: usize,
    node: NodeIndex,
}

/// Per-call traversal state.
#[derive(Default)]
struct VisitedSet {
    locals: HashMap<String, NodeIndex>,
    external: HashMap<String, HashMap<PathBuf, NodeIndex>>,
}

impl VisitedSet {
    fn external(&self, name: &str, dir: &Path) -> Option<NodeIndex> {
        self.external.get(name).and_then(|dirs| dirs.get(dir)).copied()
    }
}

/// The closure resolver.
///
/// Holds only shared, read-only inputs; every call to
/// [`resolve`](Resolver::resolve) owns its own traversal state.
pub struct Resolver<'a, F: ModuleFs + ?Sized> {
    fs: &'a F,
    registry: &'a ManifestRegistry,
    options: ResolveOptions,
}

impl<'a, F: ModuleFs + ?Sized> Resolver<'a, F> {
    /// Create a resolver over a filesystem view and a workspace registry.
    pub fn new(fs: &'a F, registry: &'a ManifestRegistry) -> Self {
        Resolver {
            fs,
            registry,
            options: ResolveOptions::default(),
        }
    }

    /// Set resolution options.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve the closure of a set of direct dependency names.
    pub fn resolve<I, S>(&self, direct_dependencies: I, search_path: &SearchPath) -> ResolveOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let graph = DependencyGraph::new(ROOT_LABEL, None);
        let deps: Vec<(String, bool)> = direct_dependencies
            .into_iter()
            .map(|name| (name.as_ref().to_string(), false))
            .collect();

        self.run(graph, deps, search_path, None)
    }

    /// Resolve the closure of a workspace member's runtime dependencies.
    pub fn resolve_package(
        &self,
        target: &WorkspaceManifest,
        search_path: &SearchPath,
    ) -> ResolveOutcome {
        let graph = DependencyGraph::new(target.name().as_str(), Some(target.directory()));
        let deps: Vec<(String, bool)> = target
            .manifest()
            .runtime_dependencies(self.options.include_optional)
            .into_iter()
            .map(|(name, _, optional)| (name.to_string(), optional))
            .collect();

        self.run(graph, deps, search_path, Some(target.name().as_str()))
    }

    fn run(
        &self,
        mut graph: DependencyGraph,
        direct: Vec<(String, bool)>,
        search_path: &SearchPath,
        target: Option<&str>,
    ) -> ResolveOutcome {
        let mut visited = VisitedSet::default();
        let mut modules: Vec<Module> = Vec::new();
        let mut warnings = Warnings::default();

        // The target is already in the bundle; a sibling depending back on
        // it must not expand it again.
        if let Some(target) = target {
            visited.locals.insert(target.to_string(), graph.root());
        }

        let root = graph.root();
        let root_label: Rc<str> = Rc::from(graph.node(root).label.as_str());
        let search = Rc::new(search_path.clone());
        let mut worklist: Vec<WorkItem> = direct
            .into_iter()
            .rev()
            .map(|(name, optional)| WorkItem {
                name,
                search: Rc::clone(&search),
                parent: root,
                required_by: Rc::clone(&root_label),
                optional,
                depth: 0,
            })
            .collect();

        while let Some(item) = worklist.pop() {
            let name = match PackageName::new(&item.name) {
                Ok(name) => name,
                Err(e) => {
                    tracing::debug!("skipping invalid dependency name `{}`: {}", item.name, e);
                    warnings.invalid_name(&item, e.to_string());
                    continue;
                }
            };

            match self.classify(&name, &item.search) {
                Classification::Local(member) => {
                    let key = name.as_str();
                    if let Some(&node) = visited.locals.get(key) {
                        graph.add_edge(item.parent, node);
                        continue;
                    }

                    tracing::debug!("`{}` is a workspace package, following its dependencies", name);
                    let node = graph.add_node(GraphNode::new(
                        key,
                        NodeKind::Local,
                        Some(member.directory()),
                    ));
                    graph.add_edge(item.parent, node);
                    visited.locals.insert(key.to_string(), node);

                    let search = Rc::new(item.search.for_local(member.directory()));
                    let required_by: Rc<str> = Rc::from(key);
                    let deps = member
                        .manifest()
                        .runtime_dependencies(self.options.include_optional);
                    push_dependencies(&mut worklist, deps, &search, node, &required_by, item.depth);
                }

                Classification::External(found) => {
                    if let Some(node) = visited.external(name.as_str(), &found.directory) {
                        graph.add_edge(item.parent, node);
                        continue;
                    }

                    let manifest = match self.fs.read_manifest(&found.directory) {
                        Ok(manifest) => manifest,
                        Err(e) => {
                            tracing::debug!(
                                "could not read manifest of {}: {:#}",
                                found.directory.display(),
                                e
                            );
                            warnings.push(ResolveWarning::UnreadableManifest {
                                path: found.directory.clone(),
                                message: format!("{:#}", e),
                            });
                            None
                        }
                    };

                    let version = manifest
                        .as_ref()
                        .and_then(|m| m.version.clone())
                        .filter(|v| !v.trim().is_empty());

                    tracing::debug!(
                        "resolved `{}`{} at {}",
                        name,
                        version.as_deref().map(|v| format!(" {}", v)).unwrap_or_default(),
                        found.directory.display()
                    );

                    let node = graph.add_node(GraphNode::new(
                        name.as_str(),
                        NodeKind::External,
                        Some(&found.directory),
                    ));
                    graph.add_edge(item.parent, node);
                    visited
                        .external
                        .entry(name.as_str().to_string())
                        .or_default()
                        .insert(found.directory.clone(), node);

                    if let Some(manifest) = &manifest {
                        let search = Rc::new(item.search.descend(&found));
                        let required_by: Rc<str> = match &version {
                            Some(v) => Rc::from(format!("{}@{}", name, v)),
                            None => Rc::from(name.as_str()),
                        };
                        let deps = manifest.runtime_dependencies(self.options.include_optional);
                        push_dependencies(
                            &mut worklist,
                            deps,
                            &search,
                            node,
                            &required_by,
                            item.depth + 1,
                        );
                    }

                    modules.push(Module {
                        name,
                        version,
                        directory: found.directory,
                        install_path: found.install_path,
                        depth: item.depth,
                        node,
                    });
                }

                Classification::Missing => {
                    tracing::debug!(
                        "`{}` (required by {}) is not installed in {}",
                        name,
                        item.required_by,
                        item.search
                    );
                    warnings.unresolved(name.as_str(), &item);
                }
            }
        }

        let closure = build_closure(modules, &mut graph);

        ResolveOutcome {
            closure,
            warnings: warnings.into_vec(),
            graph,
        }
    }

    fn classify(&self, name: &PackageName, search: &SearchPath) -> Classification<'a> {
        if let Some(member) = self.registry.get(name.as_str()) {
            return Classification::Local(member);
        }

        match search.find(self.fs, name) {
            Some(found) => Classification::External(found),
            None => Classification::Missing,
        }
    }
}

fn push_dependencies(
    worklist: &mut Vec<WorkItem>,
    deps: Vec<(&str, &str, bool)>,
    search: &Rc<SearchPath>,
    parent: NodeIndex,
    required_by: &Rc<str>,
    depth: usize,
) {
    // Reversed so the first dependency is popped first.
    for (name, _range, optional) in deps.into_iter().rev() {
        worklist.push(WorkItem {
            name: name.to_string(),
            search: Rc::clone(search),
            parent,
            required_by: Rc::clone(required_by),
            optional,
            depth,
        });
    }
}

/// Turn traversed modules into a closure keyed by specifier.
///
/// A name is versioned in its specifier only when more than one distinct
/// version of it was reached. Modules that end up with the same specifier
/// (the same version installed in two places) are bundled once, from the
/// shallowest install location; ties go to the first one reached.
fn build_closure(modules: Vec<Module>, graph: &mut DependencyGraph) -> Closure {
    let mut versions: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for module in &modules {
        let entry = versions.entry(module.name.as_str()).or_default();
        if let Some(version) = module.version.as_deref() {
            entry.insert(version);
        }
    }

    let specifiers: Vec<String> = modules
        .iter()
        .map(|m| {
            let needs_disambiguation = versions
                .get(m.name.as_str())
                .map(|v| v.len() > 1)
                .unwrap_or(false);
            format_specifier(m.name.as_str(), m.version.as_deref(), needs_disambiguation)
        })
        .collect();

    let mut chosen: HashMap<&str, usize> = HashMap::new();
    for (idx, specifier) in specifiers.iter().enumerate() {
        let depth = modules[idx].install_path.components().count();
        chosen
            .entry(specifier.as_str())
            .and_modify(|best| {
                if depth < modules[*best].install_path.components().count() {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }
    let chosen: HashSet<usize> = chosen.into_values().collect();

    let mut closure = Closure::new();
    for (idx, (module, specifier)) in modules.into_iter().zip(specifiers).enumerate() {
        graph.relabel(module.node, specifier.as_str());

        if !chosen.contains(&idx) {
            tracing::debug!(
                "`{}` at {} duplicates an already bundled copy",
                specifier,
                module.directory.display()
            );
            continue;
        }

        closure.insert(ResolvedDependency::new(
            specifier,
            module.name,
            module.version,
            module.directory,
            module.install_path,
            module.depth,
        ));
    }

    closure
}

/// Warning list with unresolved names merged.
#[derive(Default)]
struct Warnings {
    list: Vec<ResolveWarning>,
    unresolved: HashMap<String, usize>,
    invalid: HashSet<(String, String)>,
}

impl Warnings {
    fn push(&mut self, warning: ResolveWarning) {
        self.list.push(warning);
    }

    fn unresolved(&mut self, name: &str, item: &WorkItem) {
        let requirer = item.required_by.to_string();

        if let Some(&idx) = self.unresolved.get(name) {
            if let ResolveWarning::Unresolved {
                required_by,
                optional,
                ..
            } = &mut self.list[idx]
            {
                if !required_by.contains(&requirer) {
                    required_by.push(requirer);
                }
                *optional = *optional && item.optional;
            }
            return;
        }

        self.unresolved.insert(name.to_string(), self.list.len());
        self.list.push(ResolveWarning::Unresolved {
            name: name.to_string(),
            required_by: vec![requirer],
            optional: item.optional,
        });
    }

    fn invalid_name(&mut self, item: &WorkItem, message: String) {
        let key = (item.name.clone(), item.required_by.to_string());
        if !self.invalid.insert(key) {
            return;
        }
        self.list.push(ResolveWarning::InvalidName {
            name: item.name.clone(),
            required_by: item.required_by.to_string(),
            message,
        });
    }

    fn into_vec(self) -> Vec<ResolveWarning> {
        self.list
    }
}
