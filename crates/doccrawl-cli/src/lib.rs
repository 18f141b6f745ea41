//! doccrawl CLI - crawl documentation sites into markdown and detect drift
//!
//! Each source lives under `sources/<name>/` in the workspace root with a
//! `config.toml`, the `.crawl-state.json` written by the last crawl, and the
//! generated `output/` tree.
use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;
mod workspace;

use crate::cli::{Cli, Commands};
use crate::commands::{check, check_remote, crawl, list};
use crate::utils::initialize_logging;
use crate::workspace::Workspace;

/// Execute the doccrawl CLI with the currently configured environment.
///
/// # Errors
///
/// Returns an error if logging setup, source loading, or the command fails.
pub async fn run() -> Result<()> {
    // Convert Broken pipe panics into a clean exit
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("broken pipe") {
            std::process::exit(0);
        }
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let workspace = Workspace::resolve(cli.root.clone())?;

    match &cli.command {
        Commands::List { format } => list::execute(&workspace, format.resolve()),
        Commands::Crawl(args) => crawl::execute(&workspace, args, cli.quiet).await,
        Commands::Check { source, format } => {
            check::execute(&workspace, source, format.resolve())
        },
        Commands::CheckRemote(args) => check_remote::execute(&workspace, args, cli.quiet).await,
    }
}
