//! Dependency closure resolution.
//!
//! Nothing here picks versions: the installer already did that. The
//! resolver walks what is on disk, the way the host module loader would,
//! and reports which installed modules a workspace package needs.

pub mod closure;
pub mod errors;
pub mod graph;
pub mod resolve;
pub mod search_path;
pub mod specifier;

pub use closure::{Closure, ResolvedDependency};
pub use errors::ResolveWarning;
pub use graph::{DependencyGraph, GraphNode, NodeKind};
pub use resolve::{ResolveOptions, ResolveOutcome, Resolver};
pub use search_path::{SearchPath, SearchScope};
pub use specifier::{format_specifier, parse_specifier};
