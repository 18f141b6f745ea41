//! Terminal progress for crawl events.

use doccrawl_core::{CrawlEvent, EventSink};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use tracing::{debug, warn};

/// Bar for a known number of pages.
pub fn create_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Whether progress output should be drawn at all.
pub fn progress_enabled(quiet: bool) -> bool {
    !quiet && std::io::stderr().is_terminal()
}

/// Renders [`CrawlEvent`]s as a progress bar on stderr.
pub struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    /// Sink drawing to stderr, or a hidden one when `enabled` is false.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            create_bar(0, "Starting")
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::DiscoveryLevel { level, urls } => {
                self.bar.set_message(format!("Discovery level {level}"));
                debug!("Discovery level {level}: crawling {urls} URLs");
            },
            CrawlEvent::DiscoveryLevelDone { level, new_urls } => {
                self.bar
                    .println(format!("Discovery level {level}: found {new_urls} new URLs"));
            },
            CrawlEvent::FetchStarted { total } => {
                self.bar.reset();
                self.bar.set_length(total as u64);
            },
            CrawlEvent::PageFetched { url, .. } => {
                self.bar.inc(1);
                debug!("Fetched {url}");
            },
            CrawlEvent::PageFailed { url, error, .. } => {
                self.bar.inc(1);
                self.bar.suspend(|| warn!("Failed to fetch {url}: {error}"));
            },
            CrawlEvent::PageWritten { identifier } => debug!("Written: {identifier}.md"),
            CrawlEvent::PageSkipped { url } => {
                self.bar.suspend(|| warn!("No output path for {url}, skipped"));
            },
            CrawlEvent::IndexWritten { path } => debug!("Written: {}", path.display()),
        }
    }
}
