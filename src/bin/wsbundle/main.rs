//! wsbundle CLI - bundle a JavaScript workspace package for deployment

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use wsbundle::core::WorkspaceError;
use wsbundle::ops::PackageError;
use wsbundle::util::diagnostic::emit;
use wsbundle::util::{Diagnostic, GlobalContext};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        emit(&error_diagnostic(&e), color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("wsbundle=debug")
    } else {
        EnvFilter::new("wsbundle=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(color)
        .with_writer(io::stderr)
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(color);
    let root = cli.root.as_deref();

    match cli.command {
        Commands::Package(args) => commands::package::execute(args, &ctx, root),
        Commands::List(args) => commands::list::execute(args, &ctx, root),
        Commands::Tree(args) => commands::tree::execute(args, &ctx, root),
        Commands::Why(args) => commands::why::execute(args, &ctx, root),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Turn an error into a diagnostic: the error itself, its causes as
/// context, and the help attached to known error types.
fn error_diagnostic(err: &anyhow::Error) -> Diagnostic {
    let mut diag = Diagnostic::error(err.to_string());
    for cause in err.chain().skip(1) {
        diag = diag.with_note(cause.to_string());
    }

    let help = if let Some(e) = err.downcast_ref::<WorkspaceError>() {
        miette::Diagnostic::help(e).map(|h| h.to_string())
    } else if let Some(e) = err.downcast_ref::<PackageError>() {
        miette::Diagnostic::help(e).map(|h| h.to_string())
    } else {
        None
    };
    if let Some(help) = help {
        diag = diag.with_help(help);
    }
    diag
}
