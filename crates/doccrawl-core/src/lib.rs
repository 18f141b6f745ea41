//! # doccrawl-core
//!
//! Core functionality for doccrawl - crawl documentation sites into a tree
//! of clean markdown files and detect when that tree drifts from the site.
//!
//! ## Architecture
//!
//! - **Fingerprints**: Short content hashes used as change signals
//! - **State**: One JSON document per source recording what was generated
//! - **Change detection**: Tiered remote checks (`ETag`, `Last-Modified`,
//!   content) and a purely local check of the generated files
//! - **Links**: Rewriting internal links into relative `.md` paths
//! - **Crawling**: Discovery and bounded-concurrency fetching through an
//!   external rendering engine
//! - **Generation**: Cleaning, writing, and indexing the markdown tree
//!
//! ## Quick Start
//!
//! ```rust
//! use doccrawl_core::detect::{ChangeStatus, check_local_file};
//! use doccrawl_core::fingerprint::page_fingerprint;
//! use doccrawl_core::state::{CrawlState, PageRecord};
//!
//! let dir = tempfile::tempdir()?;
//! let output = dir.path().join("output");
//! std::fs::create_dir_all(&output)?;
//! std::fs::write(output.join("intro.md"), "# Intro\n\nHello")?;
//!
//! let mut state = CrawlState::load(dir.path());
//! state.set_page(
//!     "intro",
//!     PageRecord::new("https://example.com/intro", page_fingerprint("Intro", "Hello"), "Intro"),
//! );
//!
//! let record = state.get_page("intro").unwrap();
//! let result = check_local_file(&output, "intro", record);
//! assert_eq!(result.status, ChangeStatus::Unchanged);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Faults return [`Result<T, Error>`]. Expected outcomes of a check (a page
//! that disappeared, an unreachable server during a probe) are reported as
//! [`detect::ChangeResult`] values instead.

/// Markdown cleanup rules
pub mod cleaner;
/// Per-source configuration
pub mod config;
/// Discovery and page fetching
pub mod crawl;
/// Change detection against the site or the local tree
pub mod detect;
/// Error types and result aliases
pub mod error;
/// Progress events
pub mod events;
/// HTTP validator probing
pub mod fetcher;
/// Content fingerprints
pub mod fingerprint;
/// Firecrawl CLI integration
pub mod firecrawl;
/// Markdown and index generation
pub mod generate;
/// Internal link rewriting
pub mod links;
/// Built-in source profiles
pub mod sources;
/// Per-source page state
pub mod state;

// Re-export commonly used types
pub use config::{ResolvedSource, SourceConfig, SourceOverrides};
pub use detect::{
    ChangeDetector, ChangeReason, ChangeResult, ChangeStatus, ChangeSummary, detect_removed,
};
pub use error::{Error, Result};
pub use events::{CrawlEvent, EventSink, NullSink, TracingSink};
pub use fetcher::HttpValidatorProbe;
pub use fingerprint::{fingerprint, page_fingerprint};
pub use links::{LinkTransformer, UrlMapper};
pub use sources::{SourceProfile, SourceRegistry};
pub use state::{CrawlState, PageRecord};
