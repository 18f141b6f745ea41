//! # CLI Structure and Argument Parsing
//!
//! `doccrawl` operates on a workspace root holding one directory per source
//! under `sources/`:
//!
//! ```bash
//! doccrawl list
//! doccrawl crawl mdn-web-animations-api --max-concurrent 10
//! doccrawl crawl mdn-web-animations-api --discover-only
//! doccrawl check mdn-web-animations-api
//! doccrawl check-remote mdn-web-animations-api --headers-only -f json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use doccrawl_core::SourceOverrides;

use crate::utils::cli_args::FormatArg;

/// Main CLI structure for the `doccrawl` command
#[derive(Parser, Clone, Debug)]
#[command(name = "doccrawl")]
#[command(version)]
#[command(about = "doccrawl - crawl documentation sites into markdown and detect drift", long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Directory containing `sources/`. Also via `DOCCRAWL_ROOT`.
    #[arg(long, global = true, value_name = "DIR", env = "DOCCRAWL_ROOT")]
    pub root: Option<PathBuf>,

    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List sources that have a config file
    #[command(visible_alias = "sources")]
    List {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Discover, fetch and generate the markdown tree for a source
    Crawl(CrawlArgs),

    /// Compare generated files with the saved state
    Check {
        /// Source directory name under `sources/`
        source: String,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Compare the live site with the saved state
    CheckRemote(CheckRemoteArgs),
}

/// Arguments for `doccrawl crawl`
#[derive(Args, Clone, Debug)]
pub struct CrawlArgs {
    /// Source directory name under `sources/`
    pub source: String,

    /// Only discover and list URLs, don't fetch them
    #[arg(short = 'd', long)]
    pub discover_only: bool,

    /// Use only the profile's known pages instead of following links
    #[arg(long)]
    pub skip_discovery: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for `doccrawl check-remote`
#[derive(Args, Clone, Debug)]
pub struct CheckRemoteArgs {
    /// Source directory name under `sources/`
    pub source: String,

    /// Compare HTTP validators only; pages without a matching validator are
    /// reported as changed
    #[arg(long)]
    pub headers_only: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub format: FormatArg,
}

/// Per-run overrides of a source's config
#[derive(Args, Clone, Debug, Default)]
pub struct OverrideArgs {
    /// Maximum concurrent page fetches (1-50)
    #[arg(short = 'c', long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Override language (e.g. fr, es, de)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,
}

impl From<&OverrideArgs> for SourceOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            language: args.language.clone(),
            max_concurrent: args.max_concurrent,
        }
    }
}
