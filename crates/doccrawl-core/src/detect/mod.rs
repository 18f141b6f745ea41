//! Page change detection.
//!
//! Classifies previously generated pages as unchanged, changed, new or
//! removed. Two variants exist:
//!
//! - [`ChangeDetector`] compares a saved [`PageRecord`] against the live
//!   site, cheapest signal first: `ETag`, then `Last-Modified`, then a
//!   content fingerprint of a freshly rendered copy.
//! - [`check_local_file`] compares a saved record against the generated
//!   file on disk without touching the network.
//!
//! Every check returns a [`ChangeResult`]. Missing, new and unreachable
//! pages are classifications, not errors.
//!
//! [`PageRecord`]: crate::state::PageRecord

mod local;
mod remote;

use std::fmt;

use serde::{Serialize, Serializer};

pub use local::{
    INDEX_FILE, check_local_file, check_local_tree, find_untracked_files, strip_front_matter,
};
pub use remote::{
    ChangeDetector, ContentFetcher, DEFAULT_PROBE_TIMEOUT, ProbeResponse, ValidatorProbe,
    detect_removed,
};

/// Outcome of a single page check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Page matches the saved record.
    Unchanged,
    /// Page diverged from the saved record.
    Changed,
    /// Page has no saved record.
    New,
    /// Saved page no longer exists.
    Removed,
}

impl ChangeStatus {
    /// Lowercase tag used in reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
            Self::New => "new",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which signal produced a classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    /// `ETag` matched the saved validator.
    Etag,
    /// `Last-Modified` matched the saved validator.
    LastModified,
    /// Decided by comparing content fingerprints, or by the conservative
    /// fallback when no signal was conclusive.
    ContentHash,
    /// No saved record exists for the page.
    NewPage,
    /// A generated file exists on disk without a saved record.
    NewLocalFile,
    /// The generated file is gone.
    MissingFile,
    /// The generated file was edited after generation.
    LocalModified,
    /// The page was absent from the current crawl.
    NotFound,
    /// The generated file exists but could not be read.
    ReadError(String),
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Etag => f.write_str("etag"),
            Self::LastModified => f.write_str("last_modified"),
            Self::ContentHash => f.write_str("content_hash"),
            Self::NewPage => f.write_str("new_page"),
            Self::NewLocalFile => f.write_str("new_local_file"),
            Self::MissingFile => f.write_str("missing_file"),
            Self::LocalModified => f.write_str("local_modified"),
            Self::NotFound => f.write_str("not_found"),
            Self::ReadError(detail) => write!(f, "read_error:{detail}"),
        }
    }
}

impl Serialize for ChangeReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classification of one page. Produced for reporting, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResult {
    /// URL of the page; empty for files that were never crawled.
    pub source_url: String,
    /// Page identifier.
    pub identifier: String,
    /// Classification.
    pub status: ChangeStatus,
    /// Signal that produced the classification.
    pub reason: ChangeReason,
}

impl ChangeResult {
    /// Build a result.
    pub fn new(
        source_url: impl Into<String>,
        identifier: impl Into<String>,
        status: ChangeStatus,
        reason: ChangeReason,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            identifier: identifier.into(),
            status,
            reason,
        }
    }
}

/// Results of a check pass grouped by status.
///
/// Each bucket is sorted by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    /// Pages matching their saved record.
    pub unchanged: Vec<ChangeResult>,
    /// Pages that diverged.
    pub changed: Vec<ChangeResult>,
    /// Pages without a saved record.
    pub new: Vec<ChangeResult>,
    /// Saved pages that are gone.
    pub removed: Vec<ChangeResult>,
}

impl ChangeSummary {
    /// Group `results` into buckets.
    pub fn from_results(results: impl IntoIterator<Item = ChangeResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                ChangeStatus::Unchanged => summary.unchanged.push(result),
                ChangeStatus::Changed => summary.changed.push(result),
                ChangeStatus::New => summary.new.push(result),
                ChangeStatus::Removed => summary.removed.push(result),
            }
        }
        for bucket in [
            &mut summary.unchanged,
            &mut summary.changed,
            &mut summary.new,
            &mut summary.removed,
        ] {
            bucket.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        }
        summary
    }

    /// Total number of classified pages.
    pub fn total(&self) -> usize {
        self.unchanged.len() + self.changed.len() + self.new.len() + self.removed.len()
    }

    /// Whether anything other than `unchanged` was reported.
    pub fn has_drift(&self) -> bool {
        !(self.changed.is_empty() && self.new.is_empty() && self.removed.is_empty())
    }
}
