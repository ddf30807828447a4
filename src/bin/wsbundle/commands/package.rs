//! `wsbundle package` command

use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::Result;

use super::{deny_warnings, load_workspace, report_warnings, resolve_options};
use crate::cli::PackageArgs;
use wsbundle::ops::{package, PackageError, PackageOptions, PackageResult};
use wsbundle::util::fs::relative_path;
use wsbundle::util::GlobalContext;

pub fn execute(args: PackageArgs, ctx: &GlobalContext, root: Option<&Path>) -> Result<()> {
    let (ws, config) = load_workspace(ctx, root)?;

    // Paths given on the command line are relative to cwd; configured ones
    // are relative to the workspace root.
    let opts = PackageOptions {
        build_dir: args
            .build_dir
            .map(|p| ctx.cwd().join(p))
            .or_else(|| config.package.build_dir.clone()),
        output: args.output.map(|p| ctx.cwd().join(p)),
        output_dir: config.package.output_dir.clone(),
        build: !args.no_build && config.build(),
        package_manager: args
            .package_manager
            .or_else(|| config.package.package_manager.clone()),
        layout: args.layout.or(config.layout()).unwrap_or_default(),
        format: args.format.or(config.format()).unwrap_or_default(),
        keep_build_dir: args.keep_build_dir,
        no_archive: args.no_archive,
        dry_run: args.dry_run,
        deny_warnings: deny_warnings(&args.resolve, &config),
        progress: !ctx.is_verbose() && io::stderr().is_terminal(),
        resolve: resolve_options(ctx, &args.resolve, &config),
    };

    let result = match package(&ws, &args.selector, &opts) {
        Ok(result) => result,
        Err(err) => {
            if let Some(PackageError::DeniedWarnings { warnings, .. }) = err.downcast_ref() {
                report_warnings(ctx, warnings);
            }
            return Err(err);
        }
    };

    report_warnings(ctx, &result.warnings);

    if opts.dry_run {
        print_plan(&result);
        return Ok(());
    }

    if let Some(archive) = &result.archive {
        eprintln!(
            "    Finished `{}` -> {} ({} files, {} bytes)",
            result.package,
            relative_path(ctx.cwd(), &archive.path).display(),
            archive.files,
            archive.size
        );
        println!("{}  {}", archive.sha256, archive.path.display());
    } else {
        eprintln!(
            "    Finished `{}` -> {}",
            result.package,
            relative_path(ctx.cwd(), &result.build_dir).display()
        );
    }

    Ok(())
}

fn print_plan(result: &PackageResult) {
    println!(
        "{} ({} module(s) to copy)",
        result.package,
        result.plan.copies.len()
    );
    for copy in &result.plan.copies {
        println!("  {} -> {}", copy.specifier, copy.destination.display());
    }
    for nested in &result.plan.nested {
        println!("  {} (inside its parent)", nested);
    }
    for (dropped, kept) in &result.plan.collisions {
        println!("  {} (skipped, collides with {})", dropped, kept);
    }
}
