//! List command implementation

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceInfo {
    name: String,
    title: String,
    base_url: String,
    profile: String,
    pages: usize,
    last_crawl: Option<String>,
}

/// Execute the list command
pub fn execute(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    let sources = collect(workspace);

    match format {
        OutputFormat::Text => {
            if sources.is_empty() {
                println!(
                    "No sources found in {}",
                    workspace.sources_dir().display()
                );
                return Ok(());
            }
            print!("{}", render_text(&sources));
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sources)?),
    }
    Ok(())
}

fn collect(workspace: &Workspace) -> Vec<SourceInfo> {
    let mut sources = Vec::new();
    for name in workspace.source_names() {
        let config = match workspace.load_config(&name) {
            Ok(config) => config,
            Err(e) => {
                warn!("Skipping {name}: {e:#}");
                continue;
            },
        };
        let state = doccrawl_core::CrawlState::load(workspace.source_dir(&name));
        sources.push(SourceInfo {
            title: config.display_name(&name).to_string(),
            base_url: config.base_url.clone(),
            profile: config.profile.clone(),
            pages: state.page_count(),
            last_crawl: state.last_crawl().map(|t| t.to_rfc3339()),
            name,
        });
    }
    sources
}

fn render_text(sources: &[SourceInfo]) -> String {
    let mut out = format!("Available sources:\n{}\n", "-".repeat(40));
    for source in sources {
        out.push_str(&format!("  {}\n", source.name.cyan().bold()));
        out.push_str(&format!("    Title: {}\n", source.title));
        out.push_str(&format!("    URL: {}\n", source.base_url));
        if source.pages > 0 {
            out.push_str(&format!("    Pages: {}\n", source.pages));
        }
        out.push('\n');
    }
    out
}
