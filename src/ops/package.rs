//! Packaging operation.
//!
//! Assembles a self-contained bundle for one workspace package: its source
//! tree, the output of its build script, and every installed module it needs
//! at runtime, laid out so the host module loader finds them. The bundle
//! directory is then archived and removed.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use miette::Diagnostic;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{PackageName, Workspace, WorkspaceManifest, MODULES_DIR};
use crate::ops::archive::{write_archive, ArchiveFormat, ArchiveInfo};
use crate::ops::resolve::{resolve_member, ResolvePackageOptions};
use crate::resolver::{Closure, DependencyGraph, NodeKind, ResolveWarning, ResolvedDependency};
use crate::util::fs::{copy_dir_all, is_inside, remove_dir_all_if_exists};
use crate::util::process::{find_package_manager, ProcessBuilder};

/// Default build directory, relative to the workspace root.
pub const DEFAULT_BUILD_DIR: &str = "_build";

/// Name of the build script run before bundling.
pub const BUILD_SCRIPT: &str = "build";

/// Where dependencies go inside the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// The package at the archive root, dependencies in `node_modules/`
    #[default]
    Flat,
    /// Everything below a top-level directory named after the package
    Layered,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Flat => write!(f, "flat"),
            Layout::Layered => write!(f, "layered"),
        }
    }
}

impl FromStr for Layout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(Layout::Flat),
            "layered" => Ok(Layout::Layered),
            _ => bail!("unknown layout `{}` (expected flat or layered)", s),
        }
    }
}

/// Packaging failures that are not plain I/O errors.
#[derive(Debug, Error, Diagnostic)]
pub enum PackageError {
    #[error("build script of `{package}` failed\n{output}")]
    #[diagnostic(
        code(wsbundle::package::build_failed),
        help("Fix the build, or skip it with `--no-build`")
    )]
    BuildFailed { package: String, output: String },

    #[error("resolving `{package}` produced {} warning(s)", warnings.len())]
    #[diagnostic(
        code(wsbundle::package::warnings),
        help("Fix the warnings above, or drop `--deny-warnings`")
    )]
    DeniedWarnings {
        package: String,
        warnings: Vec<ResolveWarning>,
    },

    #[error("build directory {} overlaps the package being bundled", build_dir.display())]
    #[diagnostic(
        code(wsbundle::package::build_dir),
        help("Pick a build directory outside the package, such as `_build` at the workspace root")
    )]
    BuildDirOverlapsPackage { build_dir: PathBuf },

    #[error("build directory {} overlaps {}", build_dir.display(), path.display())]
    #[diagnostic(
        code(wsbundle::package::build_dir_workspace),
        help("The build directory is wiped before use; pick one that holds no workspace files")
    )]
    BuildDirOverlapsWorkspace { build_dir: PathBuf, path: PathBuf },

    #[error(
        "archive {} would be written inside the build directory {}",
        output.display(),
        build_dir.display()
    )]
    #[diagnostic(
        code(wsbundle::package::output),
        help("Write the archive outside the build directory")
    )]
    OutputInsideBuildDir { output: PathBuf, build_dir: PathBuf },
}

/// Options for packaging a workspace package.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Build directory (default: `<root>/_build`); relative paths are
    /// taken from the workspace root
    pub build_dir: Option<PathBuf>,

    /// Archive path (default: `<output_dir>/<sanitized name>.<ext>`)
    pub output: Option<PathBuf>,

    /// Directory for the default archive path (default: workspace root)
    pub output_dir: Option<PathBuf>,

    /// Run the package's build script
    pub build: bool,

    /// Package manager to run the build script with
    pub package_manager: Option<String>,

    /// Bundle layout
    pub layout: Layout,

    /// Archive format
    pub format: ArchiveFormat,

    /// Keep the build directory after archiving
    pub keep_build_dir: bool,

    /// Assemble the build directory but do not archive it
    pub no_archive: bool,

    /// Report what would be bundled without touching disk
    pub dry_run: bool,

    /// Fail if resolution reports warnings
    pub deny_warnings: bool,

    /// Show a progress bar while copying dependencies
    pub progress: bool,

    /// Resolution options
    pub resolve: ResolvePackageOptions,
}

impl Default for PackageOptions {
    fn default() -> Self {
        PackageOptions {
            build_dir: None,
            output: None,
            output_dir: None,
            build: true,
            package_manager: None,
            layout: Layout::Flat,
            format: ArchiveFormat::Zip,
            keep_build_dir: false,
            no_archive: false,
            dry_run: false,
            deny_warnings: false,
            progress: false,
            resolve: ResolvePackageOptions::default(),
        }
    }
}

impl PackageOptions {
    /// Set the build directory.
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    /// Set the archive path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set whether to run the build script.
    pub fn with_build(mut self, build: bool) -> Self {
        self.build = build;
        self
    }

    /// Set the layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the archive format.
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    /// Set dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// One dependency directory copied into the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    /// Specifier of the dependency
    pub specifier: String,
    /// Directory copied from
    pub source: PathBuf,
    /// Destination, relative to the bundle's package root
    pub destination: PathBuf,
}

/// The copy plan for a closure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlan {
    /// Directories to copy
    pub copies: Vec<PlannedCopy>,
    /// Specifiers copied along with an enclosing module
    pub nested: Vec<String>,
    /// `(dropped, kept)` pairs for entries that could not be placed without
    /// overwriting another
    pub collisions: Vec<(String, String)>,
}

/// Result of packaging.
#[derive(Debug, Clone)]
pub struct PackageResult {
    /// The bundled package
    pub package: PackageName,

    /// Build directory the bundle was assembled in
    pub build_dir: PathBuf,

    /// Whether the build script ran
    pub built: bool,

    /// Dependency copies
    pub plan: CopyPlan,

    /// Resolution warnings
    pub warnings: Vec<ResolveWarning>,

    /// The archive, unless archiving was skipped
    pub archive: Option<ArchiveInfo>,

    /// Whether the build directory was left on disk
    pub build_dir_kept: bool,
}

/// Package a workspace member into a bundle.
pub fn package(ws: &Workspace, selector: &str, opts: &PackageOptions) -> Result<PackageResult> {
    let target = ws.select(selector)?;
    let build_dir = absolute(
        ws.root(),
        opts.build_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_BUILD_DIR)),
    );
    check_build_dir(ws, target, &build_dir)?;

    let dest = if opts.no_archive {
        None
    } else {
        Some(archive_path(ws, target, opts))
    };
    if let Some(output) = dest.as_ref().filter(|d| is_inside(d, &build_dir)) {
        return Err(PackageError::OutputInsideBuildDir {
            output: output.clone(),
            build_dir,
        }
        .into());
    }

    let package_root = match opts.layout {
        Layout::Flat => build_dir.clone(),
        Layout::Layered => build_dir.join(target.name().sanitized()),
    };

    tracing::info!(
        "Packaging `{}` from {}",
        target.name(),
        target.directory().display()
    );

    if !opts.dry_run {
        remove_dir_all_if_exists(&build_dir)?;
        let files = copy_dir_all(target.directory(), &package_root, &[MODULES_DIR])?;
        tracing::info!("Copied {} source file(s) to {}", files, package_root.display());
    }

    let will_build = opts.build && target.manifest().has_script(BUILD_SCRIPT);
    if will_build {
        if opts.dry_run {
            tracing::info!("[dry-run] Would run the `{}` script", BUILD_SCRIPT);
        } else {
            run_build(ws, target, &package_root, opts.package_manager.as_deref())?;
        }
    }

    let resolution = resolve_member(ws, target, &opts.resolve);
    let (closure, warnings, graph) = resolution.outcome.into_parts();
    for warning in &warnings {
        tracing::debug!("resolve warning: {}", warning);
    }
    if opts.deny_warnings && !warnings.is_empty() {
        if !opts.dry_run {
            remove_dir_all_if_exists(&build_dir)?;
        }
        return Err(PackageError::DeniedWarnings {
            package: target.name().to_string(),
            warnings,
        }
        .into());
    }

    let plan = plan_copies(&closure, &graph);
    for (dropped, kept) in &plan.collisions {
        tracing::warn!(
            "`{}` cannot be placed without overwriting `{}`, leaving it out of the bundle",
            dropped,
            kept
        );
    }

    if opts.dry_run {
        for copy in &plan.copies {
            tracing::info!(
                "[dry-run] Would copy {} -> {}",
                copy.source.display(),
                copy.destination.display()
            );
        }
        return Ok(PackageResult {
            package: target.name().clone(),
            build_dir,
            built: false,
            plan,
            warnings,
            archive: None,
            build_dir_kept: false,
        });
    }

    copy_dependencies(&plan, &package_root, opts.progress)?;
    tracing::info!("Copied {} module(s)", plan.copies.len());

    let archive = match dest {
        Some(dest) => {
            let info = write_archive(&build_dir, &dest, opts.format)?;
            tracing::info!("Wrote {} (sha256 {})", info.path.display(), info.sha256);
            Some(info)
        }
        None => None,
    };

    let build_dir_kept = opts.keep_build_dir || opts.no_archive;
    if !build_dir_kept {
        remove_dir_all_if_exists(&build_dir)?;
    }

    Ok(PackageResult {
        package: target.name().clone(),
        build_dir,
        built: will_build,
        plan,
        warnings,
        archive,
        build_dir_kept,
    })
}

/// How an entry reaches the bundle.
enum Placement {
    /// Owns its install path
    Top,
    /// Lives inside an enclosing entry's directory and is copied with it
    Nested { encloser: usize, suffix: PathBuf },
    /// Lost its install path to a shallower entry
    Displaced { winner: usize },
}

/// Who requires an entry.
#[derive(Default)]
struct Requirers {
    /// Bundled modules, as closure indices
    modules: Vec<usize>,
    /// The package itself
    root: bool,
    /// The package or one of its workspace siblings
    direct: bool,
}

/// Decide where each closure entry is copied.
///
/// Destinations mirror each module's install path below `node_modules`.
/// An entry that lives inside another entry's directory is copied along
/// with that entry. When two entries claim the same install path, the
/// shallowest keeps it and the other is placed in the `node_modules` of
/// every bundled module that requires it, where the loader finds it first.
/// An entry the package or a workspace sibling requires directly cannot
/// move; it is reported as a collision.
pub fn plan_copies(closure: &Closure, graph: &DependencyGraph) -> CopyPlan {
    let entries: Vec<&ResolvedDependency> = closure.iter().collect();
    let index: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, dep)| (dep.specifier(), idx))
        .collect();
    let requirers: Vec<Requirers> = entries
        .iter()
        .enumerate()
        .map(|(idx, dep)| requirers_of(graph, &index, idx, dep.specifier()))
        .collect();

    let mut by_install_path: HashMap<&Path, Vec<usize>> = HashMap::new();
    for (idx, dep) in entries.iter().enumerate() {
        by_install_path.entry(dep.install_path()).or_default().push(idx);
    }

    // Entries nested in another entry's directory never claim a path.
    let nested: Vec<Option<(usize, PathBuf)>> = entries
        .iter()
        .map(|dep| encloser_of(&entries, &by_install_path, dep))
        .collect();

    // Shallowest wins; on a tie, the one the package requires itself.
    let rank = |idx: usize| (entries[idx].depth(), !requirers[idx].root);
    let mut owner: HashMap<&Path, usize> = HashMap::new();
    for (idx, dep) in entries.iter().enumerate() {
        if nested[idx].is_some() {
            continue;
        }
        match owner.get(dep.install_path()).copied() {
            Some(existing) if rank(idx) < rank(existing) => {
                owner.insert(dep.install_path(), idx);
            }
            Some(_) => {}
            None => {
                owner.insert(dep.install_path(), idx);
            }
        }
    }

    let placements: Vec<Placement> = entries
        .iter()
        .enumerate()
        .map(|(idx, dep)| match &nested[idx] {
            Some((encloser, suffix)) => Placement::Nested {
                encloser: *encloser,
                suffix: suffix.clone(),
            },
            None => match owner.get(dep.install_path()) {
                Some(&winner) if winner != idx => Placement::Displaced { winner },
                _ => Placement::Top,
            },
        })
        .collect();

    let mut plan = CopyPlan::default();
    let mut locations: Vec<Option<Vec<PathBuf>>> = vec![None; entries.len()];
    let mut taken: HashMap<PathBuf, usize> = HashMap::new();
    for (idx, placement) in placements.iter().enumerate() {
        if let Placement::Top = placement {
            let path = entries[idx].install_path().to_path_buf();
            taken.insert(path.clone(), idx);
            locations[idx] = Some(vec![path]);
        }
    }

    // Displaced entries follow their requirers, which may themselves be
    // nested or displaced, so place until nothing changes.
    loop {
        let mut progress = false;
        for (idx, placement) in placements.iter().enumerate() {
            if locations[idx].is_some() {
                continue;
            }
            let placed: Option<Vec<PathBuf>> = match placement {
                Placement::Top => None,
                Placement::Nested { encloser, suffix } => locations[*encloser]
                    .as_ref()
                    .map(|paths| paths.iter().map(|p| p.join(suffix)).collect()),
                Placement::Displaced { .. } => {
                    let modules = &requirers[idx].modules;
                    if modules.iter().all(|&r| locations[r].is_some()) {
                        let name = entries[idx].name().as_str();
                        let mut paths = Vec::new();
                        for &r in modules {
                            for parent in locations[r].iter().flatten() {
                                let path = parent.join(MODULES_DIR).join(name);
                                match taken.get(&path) {
                                    Some(&holder) if holder != idx => {
                                        push_collision(&mut plan, entries[idx], entries[holder]);
                                    }
                                    Some(_) => {}
                                    None => {
                                        taken.insert(path.clone(), idx);
                                        paths.push(path);
                                    }
                                }
                            }
                        }
                        Some(paths)
                    } else {
                        None
                    }
                }
            };
            if let Some(paths) = placed {
                for path in &paths {
                    taken.entry(path.clone()).or_insert(idx);
                }
                locations[idx] = Some(paths);
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }

    for (idx, dep) in entries.iter().enumerate() {
        match &placements[idx] {
            Placement::Top => plan.copies.push(PlannedCopy {
                specifier: dep.specifier().to_string(),
                source: dep.source_directory().to_path_buf(),
                destination: Path::new(MODULES_DIR).join(dep.install_path()),
            }),
            Placement::Nested { .. } => plan.nested.push(dep.specifier().to_string()),
            Placement::Displaced { winner } => {
                let paths = locations[idx].as_deref().unwrap_or_default();
                if requirers[idx].direct || paths.is_empty() {
                    push_collision(&mut plan, dep, entries[*winner]);
                }
                for path in paths {
                    tracing::debug!("placing `{}` at {}", dep.specifier(), path.display());
                    plan.copies.push(PlannedCopy {
                        specifier: dep.specifier().to_string(),
                        source: dep.source_directory().to_path_buf(),
                        destination: Path::new(MODULES_DIR).join(path),
                    });
                }
            }
        }
    }

    plan
}

fn push_collision(plan: &mut CopyPlan, dropped: &ResolvedDependency, kept: &ResolvedDependency) {
    let pair = (dropped.specifier().to_string(), kept.specifier().to_string());
    if !plan.collisions.contains(&pair) {
        plan.collisions.push(pair);
    }
}

fn requirers_of(
    graph: &DependencyGraph,
    index: &HashMap<&str, usize>,
    idx: usize,
    specifier: &str,
) -> Requirers {
    let mut requirers = Requirers::default();
    let nodes = graph.find(specifier).into_iter().filter(|&n| {
        let node = graph.node(n);
        node.kind == NodeKind::External && node.label == specifier
    });

    for node in nodes {
        for parent in graph.dependents(node) {
            let parent_node = graph.node(parent);
            match parent_node.kind {
                NodeKind::External => {
                    if let Some(&r) = index.get(parent_node.label.as_str()) {
                        if r != idx && !requirers.modules.contains(&r) {
                            requirers.modules.push(r);
                        }
                    }
                }
                NodeKind::Root => {
                    requirers.root = true;
                    requirers.direct = true;
                }
                NodeKind::Local => requirers.direct = true,
            }
        }
    }
    requirers
}

/// The outermost entry whose directory holds `dep`, with the path of `dep`
/// below it.
fn encloser_of(
    entries: &[&ResolvedDependency],
    by_install_path: &HashMap<&Path, Vec<usize>>,
    dep: &ResolvedDependency,
) -> Option<(usize, PathBuf)> {
    enclosing_modules(dep.install_path())
        .into_iter()
        .find_map(|outer| {
            let encloser = by_install_path
                .get(outer.as_path())?
                .iter()
                .copied()
                .find(|&e| dep.source_directory().starts_with(entries[e].source_directory()))?;
            let suffix = dep.install_path().strip_prefix(&outer).ok()?;
            Some((encloser, suffix.to_path_buf()))
        })
}

/// Install paths of the modules enclosing `install_path`, outermost first:
/// `a/node_modules/b/node_modules/c` yields `a` and `a/node_modules/b`.
fn enclosing_modules(install_path: &Path) -> Vec<PathBuf> {
    let components: Vec<Component<'_>> = install_path.components().collect();
    (1..components.len())
        .filter(|&i| components[i].as_os_str() == MODULES_DIR)
        .map(|i| components[..i].iter().collect())
        .collect()
}

/// The build directory is wiped before use, so it must hold nothing the
/// workspace owns.
fn check_build_dir(
    ws: &Workspace,
    target: &WorkspaceManifest,
    build_dir: &Path,
) -> Result<(), PackageError> {
    let overlaps = |path: &Path| is_inside(build_dir, path) || is_inside(path, build_dir);

    if overlaps(target.directory()) {
        return Err(PackageError::BuildDirOverlapsPackage {
            build_dir: build_dir.to_path_buf(),
        });
    }

    let modules_dir = ws.modules_dir();
    let protected = std::iter::once(modules_dir.as_path())
        .chain(ws.member_dirs().iter().map(PathBuf::as_path));
    for path in protected {
        if overlaps(path) {
            return Err(PackageError::BuildDirOverlapsWorkspace {
                build_dir: build_dir.to_path_buf(),
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

fn copy_dependencies(plan: &CopyPlan, package_root: &Path, progress: bool) -> Result<()> {
    let pb = if progress && plan.copies.len() > 1 {
        let pb = ProgressBar::new(plan.copies.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} Copying [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let files = AtomicUsize::new(0);
    let results: Vec<Result<()>> = plan
        .copies
        .par_iter()
        .map(|copy| {
            let dst = package_root.join(&copy.destination);
            tracing::debug!("copying {} -> {}", copy.source.display(), dst.display());
            let copied = copy_dir_all(&copy.source, &dst, &[])
                .with_context(|| format!("failed to copy `{}`", copy.specifier))?;
            files.fetch_add(copied, Ordering::Relaxed);
            if let Some(pb) = &pb {
                pb.set_message(copy.specifier.clone());
                pb.inc(1);
            }
            Ok(())
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    for result in results {
        result?;
    }
    tracing::debug!("copied {} dependency file(s)", files.load(Ordering::Relaxed));
    Ok(())
}

fn run_build(
    ws: &Workspace,
    target: &WorkspaceManifest,
    package_root: &Path,
    package_manager: Option<&str>,
) -> Result<()> {
    let program = find_package_manager(package_manager)?;

    // The copied package has no node_modules of its own; point the loader
    // at the workspace install locations.
    let node_path = std::env::join_paths([
        target.directory().join(MODULES_DIR),
        ws.modules_dir(),
    ])
    .context("failed to build NODE_PATH")?;

    let cmd = ProcessBuilder::new(&program)
        .args(["run", BUILD_SCRIPT])
        .env("NODE_PATH", node_path.to_string_lossy())
        .cwd(package_root);

    tracing::info!("Running `{}` in {}", cmd.display_command(), package_root.display());
    cmd.exec_and_check()
        .map_err(|err| PackageError::BuildFailed {
            package: target.name().to_string(),
            output: format!("{:#}", err),
        })?;
    Ok(())
}

fn archive_path(ws: &Workspace, target: &WorkspaceManifest, opts: &PackageOptions) -> PathBuf {
    if let Some(output) = &opts.output {
        return absolute(ws.root(), output);
    }
    let dir = opts
        .output_dir
        .as_deref()
        .map(|d| absolute(ws.root(), d))
        .unwrap_or_else(|| ws.root().to_path_buf());
    dir.join(format!(
        "{}.{}",
        target.name().sanitized(),
        opts.format.extension()
    ))
}

fn absolute(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
