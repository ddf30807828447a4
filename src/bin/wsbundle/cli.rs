//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use wsbundle::ops::{ArchiveFormat, Layout};

/// wsbundle - package a JavaScript workspace member with its runtime dependencies
#[derive(Parser)]
#[command(name = "wsbundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Workspace root (defaults to the nearest ancestor with a `workspaces` field)
    #[arg(long, global = true, value_name = "DIR", env = "WSBUNDLE_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle a workspace package and its dependencies into an archive
    Package(PackageArgs),

    /// List the external modules a package needs at runtime
    List(ListArgs),

    /// Display the dependency tree of a package
    Tree(TreeArgs),

    /// Explain why a module is in a package's bundle
    Why(WhyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PackageArgs {
    /// Package to bundle (its `name` or its directory name)
    pub selector: String,

    /// Build directory (default: `_build` at the workspace root)
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Archive path (default: `<name>.<ext>` at the workspace root)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not run the package's build script
    #[arg(long)]
    pub no_build: bool,

    /// Package manager used to run the build script
    #[arg(long, value_name = "PROGRAM")]
    pub package_manager: Option<String>,

    /// Bundle layout [flat, layered]
    #[arg(long)]
    pub layout: Option<Layout>,

    /// Archive format [zip, tar-gz]
    #[arg(long)]
    pub format: Option<ArchiveFormat>,

    /// Keep the build directory after archiving
    #[arg(long)]
    pub keep_build_dir: bool,

    /// Assemble the build directory without archiving it
    #[arg(long)]
    pub no_archive: bool,

    /// Show what would be bundled without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Fail if any dependency cannot be resolved cleanly
    #[arg(long)]
    pub deny_warnings: bool,

    /// Do not follow optionalDependencies
    #[arg(long)]
    pub no_optional: bool,

    /// Extra modules directory searched after the workspace root
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Package to list dependencies for
    pub selector: String,

    /// Print the closure as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Package to show the tree for
    pub selector: String,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct WhyArgs {
    /// Package whose bundle to inspect
    pub selector: String,

    /// Dependency to explain (name or specifier)
    pub dependency: String,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
