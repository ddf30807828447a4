//! Search path stack - where installed modules are looked up.
//!
//! Mirrors the host module loader: a module is looked up in the nearest
//! `node_modules` first and then in each enclosing one, so a package-local
//! copy shadows the workspace-root copy of the same name.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::manifest::MODULES_DIR;
use crate::core::PackageName;
use crate::sources::ModuleFs;

/// Where a search directory sits in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// `node_modules` nested inside an installed module
    Nested,
    /// A workspace member's own `node_modules`
    Package,
    /// The workspace root `node_modules` (or an extra configured directory)
    Workspace,
}

/// One candidate modules directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDir {
    path: PathBuf,
    /// Location of this directory inside the bundle's `node_modules`.
    install_prefix: PathBuf,
    scope: SearchScope,
}

impl SearchDir {
    /// Get the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the bundle-relative prefix for modules found here.
    pub fn install_prefix(&self) -> &Path {
        &self.install_prefix
    }

    /// Get the scope.
    pub fn scope(&self) -> SearchScope {
        self.scope
    }
}

/// A module located on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// Index of the search directory that matched.
    pub index: usize,
    /// The module's directory.
    pub directory: PathBuf,
    /// Where the module goes inside the bundle's `node_modules`.
    pub install_path: PathBuf,
}

/// Ordered candidate directories, highest precedence first.
///
/// A stack is never modified once built; nested scopes are new stacks
/// derived with [`descend`](SearchPath::descend) and
/// [`for_local`](SearchPath::for_local).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<SearchDir>,
}

impl SearchPath {
    /// Create a stack from explicit directories, highest precedence first.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SearchPath {
            dirs: dirs
                .into_iter()
                .map(|path| SearchDir {
                    path: path.into(),
                    install_prefix: PathBuf::new(),
                    scope: SearchScope::Workspace,
                })
                .collect(),
        }
    }

    /// The stack for a workspace member: its own `node_modules`, then the
    /// workspace root's.
    pub fn for_package(package_dir: &Path, workspace_root: &Path) -> Self {
        SearchPath {
            dirs: vec![
                SearchDir {
                    path: package_dir.join(MODULES_DIR),
                    install_prefix: PathBuf::new(),
                    scope: SearchScope::Package,
                },
                SearchDir {
                    path: workspace_root.join(MODULES_DIR),
                    install_prefix: PathBuf::new(),
                    scope: SearchScope::Workspace,
                },
            ],
        }
    }

    /// Append extra lowest-precedence directories.
    pub fn with_extra<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(|path| SearchDir {
            path: path.into(),
            install_prefix: PathBuf::new(),
            scope: SearchScope::Workspace,
        }));
        self
    }

    /// Find the highest-precedence directory containing `name`.
    pub fn find<F: ModuleFs + ?Sized>(&self, fs: &F, name: &PackageName) -> Option<Found> {
        let relative = name.relative_path();

        self.dirs.iter().enumerate().find_map(|(index, dir)| {
            let directory = dir.path.join(&relative);
            fs.is_dir(&directory).then(|| Found {
                index,
                directory,
                install_path: dir.install_prefix.join(&relative),
            })
        })
    }

    /// The stack used for the dependencies of a module found on this stack.
    ///
    /// The module's own `node_modules` comes first, followed by the
    /// directory it was found in and everything after it. Directories with
    /// higher precedence than the match are not visible from inside the
    /// module, just as a hoisted module never sees a package-local one.
    pub fn descend(&self, found: &Found) -> SearchPath {
        let mut dirs = Vec::with_capacity(self.dirs.len() - found.index + 1);
        dirs.push(SearchDir {
            path: found.directory.join(MODULES_DIR),
            install_prefix: found.install_path.join(MODULES_DIR),
            scope: SearchScope::Nested,
        });
        dirs.extend(self.dirs[found.index..].iter().cloned());
        SearchPath { dirs }
    }

    /// The stack used for the dependencies of a workspace member living in
    /// `package_dir`: its own `node_modules`, then the workspace-wide
    /// directories of this stack.
    pub fn for_local(&self, package_dir: &Path) -> SearchPath {
        let mut dirs = vec![SearchDir {
            path: package_dir.join(MODULES_DIR),
            install_prefix: PathBuf::new(),
            scope: SearchScope::Package,
        }];
        dirs.extend(
            self.dirs
                .iter()
                .filter(|d| d.scope == SearchScope::Workspace)
                .cloned(),
        );
        SearchPath { dirs }
    }

    /// Iterate over the directories in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchDir> {
        self.dirs.iter()
    }

    /// Directory paths in precedence order.
    pub fn paths(&self) -> Vec<&Path> {
        self.dirs.iter().map(|d| d.path.as_path()).collect()
    }

    /// Number of directories.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self.dirs.iter().map(|d| d.path.display().to_string()).collect();
        write!(f, "[{}]", paths.join(", "))
    }
}
