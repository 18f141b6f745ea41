//! Progress events emitted by long-running operations.
//!
//! The library never prints. Discovery, fetching and generation report what
//! they are doing as [`CrawlEvent`]s; the caller decides whether they become
//! a progress bar, log lines, or nothing.

use std::path::PathBuf;

use tracing::{debug, info, warn};

/// Something that happened during a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// Discovery is about to fetch `urls` pages at `level` (1 = seeds).
    DiscoveryLevel {
        /// Depth level, starting at 1.
        level: usize,
        /// Pages fetched at this level.
        urls: usize,
    },
    /// A discovery level finished.
    DiscoveryLevelDone {
        /// Depth level, starting at 1.
        level: usize,
        /// URLs not seen before this level.
        new_urls: usize,
    },
    /// A batch fetch is starting.
    FetchStarted {
        /// Pages in the batch.
        total: usize,
    },
    /// One page was fetched.
    PageFetched {
        /// Requested URL.
        url: String,
        /// Pages finished so far, including this one.
        completed: usize,
        /// Pages in the batch.
        total: usize,
    },
    /// One page could not be fetched.
    PageFailed {
        /// Requested URL.
        url: String,
        /// Failure description.
        error: String,
        /// Pages finished so far, including this one.
        completed: usize,
        /// Pages in the batch.
        total: usize,
    },
    /// A generated file was written.
    PageWritten {
        /// Identifier of the file.
        identifier: String,
    },
    /// A fetched page has no output identifier.
    PageSkipped {
        /// URL without a mapping.
        url: String,
    },
    /// The index file was written.
    IndexWritten {
        /// Location of the index.
        path: PathBuf,
    },
}

/// Receives [`CrawlEvent`]s.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: CrawlEvent);
}

impl<F> EventSink for F
where
    F: Fn(CrawlEvent) + Send + Sync,
{
    fn emit(&self, event: CrawlEvent) {
        self(event);
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: CrawlEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::DiscoveryLevel { level, urls } => {
                info!("Discovery level {level}: crawling {urls} URLs");
            },
            CrawlEvent::DiscoveryLevelDone { level, new_urls } => {
                info!("Discovery level {level}: found {new_urls} new URLs");
            },
            CrawlEvent::FetchStarted { total } => info!("Fetching {total} pages"),
            CrawlEvent::PageFetched {
                url,
                completed,
                total,
            } => debug!("[{completed}/{total}] {url}"),
            CrawlEvent::PageFailed {
                url,
                error,
                completed,
                total,
            } => warn!("[{completed}/{total}] {url} failed: {error}"),
            CrawlEvent::PageWritten { identifier } => debug!("Written: {identifier}.md"),
            CrawlEvent::PageSkipped { url } => warn!("No mapping for {url}, skipped"),
            CrawlEvent::IndexWritten { path } => info!("Written: {}", path.display()),
        }
    }
}
