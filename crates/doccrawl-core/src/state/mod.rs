//! Per-source page state for incremental change detection.
//!
//! Each documentation source keeps one JSON document next to its output
//! tree, mapping a page identifier to the fingerprint and HTTP validators
//! recorded when that page was last generated.
//!
//! ## Key Types
//!
//! - [`PageRecord`]: Last-known fingerprint, validators and metadata of one page
//! - [`SourceState`]: The persisted document for one source
//! - [`CrawlState`]: File-backed store wrapping a [`SourceState`]
//!
//! ## Example
//!
//! ```rust
//! use doccrawl_core::state::{CrawlState, PageRecord};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut state = CrawlState::load(dir.path());
//! assert_eq!(state.page_count(), 0);
//!
//! state.set_page(
//!     "interfaces/Animation/index",
//!     PageRecord::new(
//!         "https://developer.mozilla.org/en-US/docs/Web/API/Animation",
//!         "sha256:0123456789abcdef",
//!         "Animation",
//!     ),
//! );
//! state.save().unwrap();
//!
//! let reloaded = CrawlState::load(dir.path());
//! assert_eq!(reloaded.page_count(), 1);
//! ```

mod store;
mod types;

pub use store::CrawlState;
pub use types::{PageRecord, STATE_SCHEMA_VERSION, SourceState};
