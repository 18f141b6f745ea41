//! File-backed page state store.
//!
//! ## Storage Layout
//!
//! ```text
//! sources/<name>/
//!   .crawl-state.json     # SourceState document
//!   output/               # generated markdown tree
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::types::{PageRecord, STATE_SCHEMA_VERSION, SourceState};
use crate::{Error, Result};

/// Page state for one source, loaded from and saved to its directory.
///
/// Mutations only touch memory until [`CrawlState::save`] is called. The
/// store is not synchronized; callers sharing it across tasks must wrap it.
#[derive(Debug, Clone)]
pub struct CrawlState {
    path: PathBuf,
    state: SourceState,
}

impl CrawlState {
    /// File name of the state document inside a source directory.
    pub const FILE_NAME: &'static str = ".crawl-state.json";

    /// Load the state for `source_dir`.
    ///
    /// Never fails. A missing, unreadable, malformed or foreign-version
    /// document yields an empty state; the last three also log a warning.
    pub fn load(source_dir: impl AsRef<Path>) -> Self {
        let source_dir = source_dir.as_ref();
        let path = source_dir.join(Self::FILE_NAME);
        let source_name = source_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let state = match Self::read_document(&path) {
            Ok(Some(state)) => state,
            Ok(None) => SourceState::empty(source_name),
            Err(e) => {
                warn!("Ignoring crawl state at {}: {e}", path.display());
                SourceState::empty(source_name)
            },
        };

        Self { path, state }
    }

    fn read_document(path: &Path) -> Result<Option<SourceState>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        let state: SourceState = serde_json::from_str(&raw)?;
        if state.schema_version != STATE_SCHEMA_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported schema version {} (expected {STATE_SCHEMA_VERSION})",
                state.schema_version
            )));
        }
        debug!("Loaded {} page records from {}", state.pages.len(), path.display());
        Ok(Some(state))
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the source this state belongs to.
    pub fn source_name(&self) -> &str {
        &self.state.source_name
    }

    /// Record for `identifier`, if any.
    pub fn get_page(&self, identifier: &str) -> Option<&PageRecord> {
        self.state.pages.get(identifier)
    }

    /// Insert or overwrite the record for `identifier`.
    ///
    /// Stamps `fetched_at` with the current time and raises the
    /// validator-support flags when the record carries a validator.
    pub fn set_page(&mut self, identifier: impl Into<String>, mut record: PageRecord) {
        record.fetched_at = Utc::now();
        if record.etag.as_deref().is_some_and(|v| !v.is_empty()) {
            self.state.supports_etag = true;
        }
        if record.last_modified.as_deref().is_some_and(|v| !v.is_empty()) {
            self.state.supports_last_modified = true;
        }
        self.state.pages.insert(identifier.into(), record);
    }

    /// Remove the record for `identifier`, returning it.
    pub fn remove_page(&mut self, identifier: &str) -> Option<PageRecord> {
        self.state.pages.remove(identifier)
    }

    /// All page records keyed by identifier.
    pub const fn pages(&self) -> &BTreeMap<String, PageRecord> {
        &self.state.pages
    }

    /// Replace the set of URLs fetched by the current crawl.
    pub fn set_crawled_urls<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.crawled_urls = urls.into_iter().map(Into::into).collect();
    }

    /// URLs the last crawl rewrote links against.
    ///
    /// Records kept from earlier crawls are not included. Documents saved
    /// without the list fall back to the source URL of every record.
    pub fn link_targets(&self) -> Vec<&str> {
        if self.state.crawled_urls.is_empty() {
            self.state
                .pages
                .values()
                .map(|record| record.source_url.as_str())
                .collect()
        } else {
            self.state.crawled_urls.iter().map(String::as_str).collect()
        }
    }

    /// Number of recorded pages.
    pub fn page_count(&self) -> usize {
        self.state.pages.len()
    }

    /// Timestamp of the last save, if the state was ever saved.
    pub const fn last_crawl(&self) -> Option<DateTime<Utc>> {
        self.state.last_crawl_timestamp
    }

    /// Whether any page has supplied an `ETag`.
    pub const fn supports_etag(&self) -> bool {
        self.state.supports_etag
    }

    /// Whether any page has supplied a `Last-Modified`.
    pub const fn supports_last_modified(&self) -> bool {
        self.state.supports_last_modified
    }

    /// Read-only view of the whole document.
    pub const fn document(&self) -> &SourceState {
        &self.state
    }

    /// Persist the full state, stamping the last-crawl timestamp.
    ///
    /// Writes pretty-printed JSON through a temp file and rename so a crash
    /// never leaves a truncated document behind. The in-memory timestamp only
    /// moves once the document is committed.
    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create source directory: {e}")))?;
        }

        let mut document = self.state.clone();
        document.last_crawl_timestamp = Some(Utc::now());
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::Storage(format!("Failed to serialize crawl state: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write temp state file: {e}")))?;

        #[cfg(target_os = "windows")]
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing state: {e}")))?;
        }

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| Error::Storage(format!("Failed to commit state file: {e}")))?;
        self.state = document;

        debug!(
            "Saved {} page records for {} to {}",
            self.state.pages.len(),
            self.state.source_name,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(url: &str, fp: &str) -> PageRecord {
        PageRecord::new(url, fp, "Title")
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("mdn-web-animations-api");

        let state = CrawlState::load(&source_dir);

        assert_eq!(state.page_count(), 0);
        assert_eq!(state.source_name(), "mdn-web-animations-api");
        assert!(state.last_crawl().is_none());
        assert_eq!(state.path(), source_dir.join(".crawl-state.json"));
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CrawlState::FILE_NAME), "{ not json").unwrap();

        let state = CrawlState::load(temp.path());

        assert_eq!(state.page_count(), 0);
    }

    #[test]
    fn test_load_foreign_schema_is_empty() {
        let temp = TempDir::new().unwrap();
        let doc = r#"{"schemaVersion": 99, "sourceName": "x", "pages": {}}"#;
        fs::write(temp.path().join(CrawlState::FILE_NAME), doc).unwrap();

        let state = CrawlState::load(temp.path());

        assert_eq!(state.document().schema_version, STATE_SCHEMA_VERSION);
        assert_eq!(state.page_count(), 0);
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());
        state.set_page(
            "guides/intro",
            record("https://site/docs/intro", "sha256:1111111111111111")
                .with_validators(Some("\"abc\"".to_string()), None),
        );
        state.set_page(
            "interfaces/Animation/index",
            record("https://site/docs/Animation", "sha256:2222222222222222")
                .with_validators(None, Some("Tue, 01 Oct 2024 10:00:00 GMT".to_string())),
        );
        state.save().unwrap();

        let reloaded = CrawlState::load(temp.path());

        assert_eq!(reloaded.pages(), state.pages());
        assert!(reloaded.supports_etag());
        assert!(reloaded.supports_last_modified());
        assert!(reloaded.last_crawl().is_some());
        assert!(!temp.path().join(".crawl-state.json.tmp").exists());
    }

    #[test]
    fn test_set_page_does_not_stamp_last_crawl() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());

        state.set_page("a", record("https://site/a", "sha256:0"));

        assert!(state.last_crawl().is_none());
        assert!(!state.supports_etag());
        assert!(!temp.path().join(CrawlState::FILE_NAME).exists());
    }

    #[test]
    fn test_set_page_overwrites_and_remove() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());

        state.set_page("a", record("https://site/a", "sha256:old"));
        state.set_page("a", record("https://site/a", "sha256:new"));
        assert_eq!(state.page_count(), 1);
        assert_eq!(state.get_page("a").unwrap().content_fingerprint, "sha256:new");

        let removed = state.remove_page("a").unwrap();
        assert_eq!(removed.content_fingerprint, "sha256:new");
        assert!(state.get_page("a").is_none());
        assert!(state.remove_page("a").is_none());
    }

    #[test]
    fn test_save_stamps_timestamp_each_time() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());

        state.save().unwrap();
        let first = state.last_crawl().unwrap();
        state.save().unwrap();
        let second = state.last_crawl().unwrap();

        assert!(second >= first);
    }

    #[test]
    fn test_save_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let mut state = CrawlState::load(blocker.join("source"));
        let err = state.save().unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(state.last_crawl().is_none());
    }

    #[test]
    fn test_link_targets_exclude_stale_records() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());
        state.set_page("a", record("https://site/a", "sha256:a"));
        state.set_page("b", record("https://site/b", "sha256:b"));

        assert_eq!(state.link_targets(), vec!["https://site/a", "https://site/b"]);

        state.set_crawled_urls(["https://site/a", "https://site/unmapped"]);
        state.save().unwrap();

        let reloaded = CrawlState::load(temp.path());
        assert_eq!(
            reloaded.link_targets(),
            vec!["https://site/a", "https://site/unmapped"]
        );
    }
}
