//! Type definitions for the page state document.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the on-disk state document layout.
///
/// Documents carrying any other version are discarded on load.
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Last-known state of one generated page.
///
/// The page identifier is the key of [`SourceState::pages`], not a field.
/// `content_fingerprint` is always computed from the final document that
/// was written to disk.
///
/// ```rust
/// use doccrawl_core::state::PageRecord;
///
/// let record = PageRecord::new("https://example.com/docs/a", "sha256:00", "A")
///     .with_validators(Some("\"v1\"".to_string()), None);
///
/// assert_eq!(record.etag.as_deref(), Some("\"v1\""));
/// assert!(record.last_modified.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// URL the content was fetched from.
    pub source_url: String,
    /// Fingerprint tag of the written document.
    pub content_fingerprint: String,
    /// Page title.
    pub title: String,
    /// When the record was last set.
    pub fetched_at: DateTime<Utc>,
    /// `ETag` validator returned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// `Last-Modified` validator returned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl PageRecord {
    /// Create a record without validators, stamped with the current time.
    #[must_use]
    pub fn new(
        source_url: impl Into<String>,
        content_fingerprint: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            content_fingerprint: content_fingerprint.into(),
            title: title.into(),
            fetched_at: Utc::now(),
            etag: None,
            last_modified: None,
        }
    }

    /// Attach HTTP validators. Empty strings are treated as absent.
    #[must_use]
    pub fn with_validators(mut self, etag: Option<String>, last_modified: Option<String>) -> Self {
        self.etag = etag.filter(|v| !v.is_empty());
        self.last_modified = last_modified.filter(|v| !v.is_empty());
        self
    }
}

/// Persisted state for one documentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceState {
    /// Layout version of this document.
    pub schema_version: u32,
    /// Name of the source (its directory name).
    pub source_name: String,
    /// Set on every save.
    #[serde(default)]
    pub last_crawl_timestamp: Option<DateTime<Utc>>,
    /// Whether any page of this source has supplied an `ETag`.
    #[serde(default)]
    pub supports_etag: bool,
    /// Whether any page of this source has supplied a `Last-Modified`.
    #[serde(default)]
    pub supports_last_modified: bool,
    /// Page records keyed by identifier.
    #[serde(default)]
    pub pages: BTreeMap<String, PageRecord>,
    /// URLs fetched by the last crawl. Links were rewritten against exactly
    /// this set, which can be smaller than the recorded pages.
    #[serde(default)]
    pub crawled_urls: BTreeSet<String>,
}

impl SourceState {
    /// Empty state for `source_name`.
    #[must_use]
    pub fn empty(source_name: impl Into<String>) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            source_name: source_name.into(),
            last_crawl_timestamp: None,
            supports_etag: false,
            supports_last_modified: false,
            pages: BTreeMap::new(),
            crawled_urls: BTreeSet::new(),
        }
    }
}
