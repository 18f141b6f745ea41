//! Parallel page fetching over a single-URL [`Scraper`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::page_links::internal_links;
use super::types::{CrawledPage, FetchOptions, FetchOutcome, PageFetcher};
use crate::Result;
use crate::config::MAX_CONCURRENCY;
use crate::detect::ValidatorProbe;
use crate::events::{CrawlEvent, EventSink};

/// Raw output of rendering one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    /// Page content as markdown.
    pub markdown: String,
    /// Document title.
    #[serde(default)]
    pub title: Option<String>,
    /// Meta description.
    #[serde(default)]
    pub description: Option<String>,
    /// Response headers, names lowercased.
    #[serde(default)]
    pub response_headers: BTreeMap<String, String>,
}

/// Renders one URL to markdown.
///
/// Implement this to plug in a different engine; the default is
/// [`FirecrawlCli`](crate::firecrawl::FirecrawlCli).
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Render `url`.
    async fn scrape(&self, url: &str, options: &FetchOptions) -> Result<ScrapedPage>;
}

/// Fetches many URLs through a [`Scraper`] with bounded concurrency.
///
/// Optionally probes every fetched page for HTTP validators that the engine
/// did not report.
pub struct ScrapeOrchestrator<S: Scraper> {
    scraper: S,
    concurrency: usize,
    events: Option<Arc<dyn EventSink>>,
    validator_probe: Option<Arc<dyn ValidatorProbe>>,
}

impl<S: Scraper> ScrapeOrchestrator<S> {
    /// Default concurrency level.
    pub const DEFAULT_CONCURRENCY: usize = 5;

    /// Orchestrator running at most `concurrency` scrapes at once,
    /// clamped to `1..=50`.
    #[must_use]
    pub fn new(scraper: S, concurrency: usize) -> Self {
        Self {
            scraper,
            concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
            events: None,
            validator_probe: None,
        }
    }

    /// Report progress to `sink`.
    #[must_use]
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Fill in `etag` and `last-modified` from `probe` when the engine
    /// returned no such headers.
    #[must_use]
    pub fn with_validator_probe(mut self, probe: Arc<dyn ValidatorProbe>) -> Self {
        self.validator_probe = Some(probe);
        self
    }

    /// Effective concurrency.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(sink) = &self.events {
            sink.emit(event);
        }
    }

    async fn fetch_one(&self, url: &str, options: &FetchOptions) -> FetchOutcome {
        let scraped = match self.scraper.scrape(url, options).await {
            Ok(scraped) => scraped,
            Err(e) => {
                if e.is_recoverable() {
                    debug!(category = e.category(), "Scrape of {url} failed: {e}");
                } else {
                    warn!(category = e.category(), "Scrape of {url} failed: {e}");
                }
                return FetchOutcome::Failure {
                    error: e.to_string(),
                };
            },
        };

        let mut headers: BTreeMap<String, String> = scraped
            .response_headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        if let Some(probe) = &self.validator_probe {
            if !headers.contains_key("etag") && !headers.contains_key("last-modified") {
                let validators = probe.probe(url).await;
                if let Some(etag) = validators.etag {
                    headers.insert("etag".to_string(), etag);
                }
                if let Some(last_modified) = validators.last_modified {
                    headers.insert("last-modified".to_string(), last_modified);
                }
            }
        }

        FetchOutcome::Success(CrawledPage {
            url: url.to_string(),
            internal_links: internal_links(url, &scraped.markdown),
            markdown: scraped.markdown,
            title: scraped.title.filter(|t| !t.trim().is_empty()),
            description: scraped.description,
            response_headers: headers,
        })
    }
}

#[async_trait]
impl<S: Scraper> PageFetcher for ScrapeOrchestrator<S> {
    async fn fetch_many(
        &self,
        urls: &[String],
        options: &FetchOptions,
    ) -> BTreeMap<String, FetchOutcome> {
        let mut unique: Vec<String> = urls.to_vec();
        unique.sort();
        unique.dedup();
        if unique.is_empty() {
            return BTreeMap::new();
        }

        let total = unique.len();
        self.emit(CrawlEvent::FetchStarted { total });

        let completed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let results: Vec<(String, FetchOutcome)> = stream::iter(unique)
            .map(|url| {
                let semaphore = Arc::clone(&semaphore);
                let completed = Arc::clone(&completed);

                async move {
                    let _permit = semaphore.acquire().await;
                    let outcome = self.fetch_one(&url, options).await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    match &outcome {
                        FetchOutcome::Success(_) => self.emit(CrawlEvent::PageFetched {
                            url: url.clone(),
                            completed: done,
                            total,
                        }),
                        FetchOutcome::Failure { error } => {
                            debug!("Fetch failed for {url}: {error}");
                            self.emit(CrawlEvent::PageFailed {
                                url: url.clone(),
                                error: error.clone(),
                                completed: done,
                                total,
                            });
                        },
                    }

                    (url, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }
}
