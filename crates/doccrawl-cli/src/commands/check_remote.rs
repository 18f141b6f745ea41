//! Remote check: the live site against the saved state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use doccrawl_core::crawl::{ScrapeOrchestrator, discover_urls};
use doccrawl_core::firecrawl::FirecrawlCli;
use doccrawl_core::generate::{PageRenderer, RenderedContentFetcher};
use doccrawl_core::{
    ChangeDetector, ChangeResult, ChangeSummary, CrawlState, EventSink, HttpValidatorProbe,
    ResolvedSource, SourceOverrides, detect_removed,
};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::debug;

use crate::cli::CheckRemoteArgs;
use crate::output::OutputFormat;
use crate::output::report::{self, CheckMode};
use crate::utils::progress::{ProgressSink, create_bar, progress_enabled};
use crate::workspace::Workspace;

/// Execute the check-remote command
pub async fn execute(workspace: &Workspace, args: &CheckRemoteArgs, quiet: bool) -> Result<()> {
    let format = args.format.resolve();
    let source = workspace.load_source(&args.source, &SourceOverrides::from(&args.overrides))?;
    let resolved = &source.resolved;
    let state = source.load_state();

    if state.page_count() == 0 {
        return report::print_no_state(&args.source, CheckMode::Remote, format);
    }
    if format == OutputFormat::Text {
        print!(
            "{}",
            report::header(&resolved.display_name, state.last_crawl(), CheckMode::Remote)
        );
    }

    let show_progress = progress_enabled(quiet) && format == OutputFormat::Text;
    let probe = Arc::new(HttpValidatorProbe::with_timeout(resolved.probe_timeout)?);
    let mut detector = ChangeDetector::new(probe).with_probe_timeout(resolved.probe_timeout);

    let current = if args.headers_only {
        saved_and_known(resolved, &state)
    } else {
        let engine = FirecrawlCli::detect()
            .await
            .context("A Firecrawl CLI is required to check page content")?;

        let progress = Arc::new(ProgressSink::new(show_progress));
        let events: Arc<dyn EventSink> = progress.clone();
        let discovery = ScrapeOrchestrator::new(engine.clone(), resolved.max_concurrent)
            .with_events(Arc::clone(&events));
        let mut urls =
            discover_urls(&discovery, &resolved.discovery_options(), events.as_ref()).await;
        progress.finish();
        urls.extend(resolved.known_urls().into_values());

        let renderer = PageRenderer::for_source(resolved, state.link_targets())?;
        let content = RenderedContentFetcher::new(
            Arc::new(ScrapeOrchestrator::new(engine, 1)),
            renderer,
            resolved.fetch_options(),
        );
        detector = detector.with_content_fetcher(Arc::new(content));

        identifiers_for(resolved, urls)
    };

    let mut results = run_checks(
        &detector,
        &current,
        &state,
        resolved.max_concurrent,
        show_progress,
    )
    .await;
    let seen: BTreeSet<String> = current.keys().cloned().collect();
    results.extend(detect_removed(state.pages(), &seen));
    let summary = ChangeSummary::from_results(results);

    match format {
        OutputFormat::Text => print!(
            "{}",
            report::render_text(&summary, &args.source, CheckMode::Remote)
        ),
        OutputFormat::Json => println!(
            "{}",
            report::render_json(&summary, &args.source, state.last_crawl(), CheckMode::Remote)?
        ),
    }
    Ok(())
}

/// Identifier to URL for every URL that has an output identifier. When two
/// URLs map to one identifier, the first in sorted order wins.
fn identifiers_for(
    source: &ResolvedSource,
    urls: impl IntoIterator<Item = String>,
) -> BTreeMap<String, String> {
    let mut current = BTreeMap::new();
    for url in urls {
        match source.profile.identifier_for(&url) {
            Some(identifier) => {
                current.entry(identifier).or_insert(url);
            },
            None => debug!("No output path for {url}"),
        }
    }
    current
}

/// Pages to probe without fetching content: everything saved, plus the
/// profile's known pages.
fn saved_and_known(source: &ResolvedSource, state: &CrawlState) -> BTreeMap<String, String> {
    let mut current: BTreeMap<String, String> = state
        .pages()
        .iter()
        .map(|(identifier, record)| (identifier.clone(), record.source_url.clone()))
        .collect();
    for (identifier, url) in source.known_urls() {
        current.entry(identifier).or_insert(url);
    }
    current
}

async fn run_checks(
    detector: &ChangeDetector,
    current: &BTreeMap<String, String>,
    state: &CrawlState,
    concurrency: usize,
    show_progress: bool,
) -> Vec<ChangeResult> {
    let bar = if show_progress {
        create_bar(current.len() as u64, "Checking pages")
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<ChangeResult> = stream::iter(current)
        .map(|(identifier, url)| {
            let bar = bar.clone();
            async move {
                let result = detector.check(identifier, url, state.get_page(identifier)).await;
                bar.inc(1);
                result
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    bar.finish_and_clear();
    results
}
