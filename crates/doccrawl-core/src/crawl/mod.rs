//! Page fetching and URL discovery.
//!
//! Rendering a page to markdown is delegated to an external engine behind
//! the [`Scraper`] trait. [`ScrapeOrchestrator`] runs a scraper over many
//! URLs with bounded concurrency and exposes the result through
//! [`PageFetcher`], which is what discovery and generation consume.

mod discover;
mod orchestrator;
mod page_links;
mod types;

pub use discover::{DiscoveryOptions, discover_urls};
pub use orchestrator::{ScrapeOrchestrator, ScrapedPage, Scraper};
pub use page_links::internal_links;
pub use types::{CrawledPage, FetchOptions, FetchOutcome, PageFetcher};
