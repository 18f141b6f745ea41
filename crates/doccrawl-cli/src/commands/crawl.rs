//! Crawl command: discover, fetch, generate, index.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use doccrawl_core::crawl::{FetchOutcome, PageFetcher, ScrapeOrchestrator, discover_urls};
use doccrawl_core::firecrawl::FirecrawlCli;
use doccrawl_core::generate::{
    MarkdownWriter, PageRenderer, generate_index, generate_markdown_files,
};
use doccrawl_core::{CrawlEvent, EventSink, HttpValidatorProbe, SourceOverrides};
use tracing::{info, warn};

use crate::cli::CrawlArgs;
use crate::utils::progress::{ProgressSink, progress_enabled};
use crate::workspace::{Source, Workspace};

/// Execute the crawl command
pub async fn execute(workspace: &Workspace, args: &CrawlArgs, quiet: bool) -> Result<()> {
    let source = workspace.load_source(&args.source, &SourceOverrides::from(&args.overrides))?;
    let resolved = &source.resolved;

    if !quiet {
        let rule = "=".repeat(60);
        println!("{rule}");
        println!("Crawling: {}", resolved.display_name.bold());
        println!("{rule}");
        println!("Base URL: {}", resolved.base_url);
        println!("Language: {}", resolved.language);
        println!("Max concurrent: {}", resolved.max_concurrent);
        println!("{rule}");
    }

    let progress = Arc::new(ProgressSink::new(progress_enabled(quiet)));
    let events: Arc<dyn EventSink> = progress.clone();

    let needs_engine = !(args.skip_discovery && args.discover_only);
    let engine = if needs_engine {
        Some(
            FirecrawlCli::detect()
                .await
                .context("A Firecrawl CLI is required to fetch pages")?,
        )
    } else {
        None
    };

    let urls = match (&engine, args.skip_discovery) {
        (Some(engine), false) => {
            let discovery = ScrapeOrchestrator::new(engine.clone(), resolved.max_concurrent)
                .with_events(Arc::clone(&events));
            let mut urls =
                discover_urls(&discovery, &resolved.discovery_options(), events.as_ref()).await;
            urls.extend(resolved.known_urls().into_values());
            urls
        },
        _ => {
            let urls: BTreeSet<String> = resolved.known_urls().into_values().collect();
            if urls.is_empty() {
                warn!("Profile '{}' has no known pages", resolved.profile.name);
            }
            if !quiet {
                println!("Using {} known URLs (discovery skipped)", urls.len());
            }
            urls
        },
    };

    if args.discover_only {
        progress.finish();
        print_discovered(&urls);
        return Ok(());
    }
    let Some(engine) = engine else {
        return Ok(());
    };

    let mut fetcher = ScrapeOrchestrator::new(engine, resolved.max_concurrent)
        .with_events(Arc::clone(&events));
    if resolved.record_validators {
        let probe = HttpValidatorProbe::with_timeout(resolved.probe_timeout)?;
        fetcher = fetcher.with_validator_probe(Arc::new(probe));
    }

    let url_list: Vec<String> = urls.iter().cloned().collect();
    let pages = fetcher
        .fetch_many(&url_list, &resolved.fetch_options())
        .await;
    let fetched = pages.values().filter(|o| o.page().is_some()).count();

    let written = generate(&source, &pages, events.as_ref())?;
    progress.finish();

    println!("\n{}", "=".repeat(60));
    println!("{}", "Crawl Complete!".green().bold());
    println!("{}", "=".repeat(60));
    println!("URLs discovered: {}", urls.len());
    println!("Pages crawled: {fetched}");
    if fetched < pages.len() {
        println!("Pages failed: {}", pages.len() - fetched);
    }
    println!("Files written: {}", written + 1);
    println!("Output directory: {}", source.output_dir().display());
    Ok(())
}

/// Write the tree, save the state, and write the index. Returns the number
/// of page files written.
fn generate(
    source: &Source,
    pages: &BTreeMap<String, FetchOutcome>,
    events: &dyn EventSink,
) -> Result<usize> {
    let resolved = &source.resolved;
    let output_dir = source.output_dir();

    let crawled = pages
        .iter()
        .filter(|(_, outcome)| outcome.page().is_some())
        .map(|(url, _)| url.as_str());
    let renderer = PageRenderer::for_source(resolved, crawled)?;
    let writer = MarkdownWriter::new(&output_dir).with_frontmatter(resolved.frontmatter);

    let mut state = source.load_state();
    let report = generate_markdown_files(
        pages,
        &renderer,
        &writer,
        Some(&mut state),
        resolved.record_validators,
        events,
    )
    .with_context(|| format!("Failed to write pages to {}", output_dir.display()))?;

    state
        .save()
        .with_context(|| format!("Failed to save {}", state.path().display()))?;
    info!("State saved: {}", state.path().display());

    let index_path = generate_index(&output_dir, &report.index, &resolved.index_options())?;
    events.emit(CrawlEvent::IndexWritten { path: index_path });

    Ok(report.files_written)
}

fn print_discovered(urls: &BTreeSet<String>) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("Discovered {} URLs:", urls.len());
    println!("{rule}");
    for url in urls {
        println!("  {url}");
    }
    println!("\nTotal: {} URLs", urls.len());
}
