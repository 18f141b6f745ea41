//! Firecrawl CLI as the page-rendering engine.
//!
//! Pages are rendered by shelling out to `firecrawl scrape`, which returns
//! markdown plus page metadata as JSON. [`FirecrawlCli`] implements
//! [`Scraper`](crate::crawl::Scraper), so it plugs straight into
//! [`ScrapeOrchestrator`](crate::crawl::ScrapeOrchestrator).
//!
//! ```rust,no_run
//! use doccrawl_core::crawl::{FetchOptions, PageFetcher, ScrapeOrchestrator};
//! use doccrawl_core::firecrawl::FirecrawlCli;
//!
//! # async fn example() -> doccrawl_core::Result<()> {
//! let cli = FirecrawlCli::detect().await?;
//! let fetcher = ScrapeOrchestrator::new(cli, 5);
//! let pages = fetcher
//!     .fetch_many(&["https://example.com/docs".to_string()], &FetchOptions::default())
//!     .await;
//! println!("Fetched {} pages", pages.len());
//! # Ok(())
//! # }
//! ```

mod detect;
mod scrape;

pub use detect::FirecrawlCli;
pub use scrape::{ScrapeOutput, build_scrape_args};

/// Minimum required version of Firecrawl CLI.
pub const MIN_VERSION: &str = "1.1.0";
