//! Tiered remote change detection.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{ChangeReason, ChangeResult, ChangeStatus};
use crate::fingerprint::fingerprint;
use crate::state::PageRecord;

/// Upper bound on a validator probe when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Validators observed by a metadata-only request.
///
/// All fields are absent when the request failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Current `ETag`.
    pub etag: Option<String>,
    /// Current `Last-Modified`.
    pub last_modified: Option<String>,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
}

/// Metadata-only request for a page's HTTP validators.
///
/// Implementations must not fail: network faults are reported as a
/// [`ProbeResponse`] with every field absent.
#[async_trait]
pub trait ValidatorProbe: Send + Sync {
    /// Probe `url`.
    async fn probe(&self, url: &str) -> ProbeResponse;
}

/// Full-content fetch used when validators are inconclusive.
///
/// Returns the canonical page document, exactly the string that generation
/// would fingerprint, or `None` when the page could not be fetched.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and render the page at `url`, which will be written as `identifier`.
    async fn fetch_document(&self, identifier: &str, url: &str) -> Option<String>;
}

/// Classifies saved pages against the live site.
///
/// Holds no mutable state, so one detector can serve concurrent checks.
#[derive(Clone)]
pub struct ChangeDetector {
    probe: Arc<dyn ValidatorProbe>,
    content: Option<Arc<dyn ContentFetcher>>,
    probe_timeout: Duration,
}

impl ChangeDetector {
    /// Detector with validator probing only.
    ///
    /// Without a content fetcher, inconclusive validators classify a page
    /// as `changed`.
    pub fn new(probe: Arc<dyn ValidatorProbe>) -> Self {
        Self {
            probe,
            content: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Enable the content-fingerprint tier.
    #[must_use]
    pub fn with_content_fetcher(mut self, content: Arc<dyn ContentFetcher>) -> Self {
        self.content = Some(content);
        self
    }

    /// Bound each validator probe. Exceeding it counts as "no validators".
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Whether the content-fingerprint tier is available.
    pub const fn has_content_tier(&self) -> bool {
        self.content.is_some()
    }

    /// Classify one page.
    ///
    /// 1. No saved record: `new` / `new_page`.
    /// 2. Current and saved `ETag` both present and equal: `unchanged` / `etag`.
    /// 3. Current and saved `Last-Modified` both present and equal:
    ///    `unchanged` / `last_modified`.
    /// 4. Content tier: fingerprint of the fetched document compared to the
    ///    saved fingerprint, `unchanged` or `changed` / `content_hash`.
    /// 5. Otherwise `changed` / `content_hash`.
    #[instrument(level = "debug", skip_all, fields(identifier = %identifier, url = %source_url))]
    pub async fn check(
        &self,
        identifier: &str,
        source_url: &str,
        saved: Option<&PageRecord>,
    ) -> ChangeResult {
        let Some(saved) = saved else {
            return ChangeResult::new(
                source_url,
                identifier,
                ChangeStatus::New,
                ChangeReason::NewPage,
            );
        };

        let current = self.probe_validators(source_url).await;

        if matches_validator(current.etag.as_deref(), saved.etag.as_deref()) {
            return ChangeResult::new(
                source_url,
                identifier,
                ChangeStatus::Unchanged,
                ChangeReason::Etag,
            );
        }
        if matches_validator(
            current.last_modified.as_deref(),
            saved.last_modified.as_deref(),
        ) {
            return ChangeResult::new(
                source_url,
                identifier,
                ChangeStatus::Unchanged,
                ChangeReason::LastModified,
            );
        }

        if let Some(content) = &self.content {
            if let Some(document) = content.fetch_document(identifier, source_url).await {
                let status = if fingerprint(&document) == saved.content_fingerprint {
                    ChangeStatus::Unchanged
                } else {
                    ChangeStatus::Changed
                };
                return ChangeResult::new(source_url, identifier, status, ChangeReason::ContentHash);
            }
            debug!("Content fetch failed for {source_url}");
        }

        ChangeResult::new(
            source_url,
            identifier,
            ChangeStatus::Changed,
            ChangeReason::ContentHash,
        )
    }

    async fn probe_validators(&self, url: &str) -> ProbeResponse {
        if let Ok(response) = tokio::time::timeout(self.probe_timeout, self.probe.probe(url)).await
        {
            response
        } else {
            debug!("Validator probe timed out after {:?} for {url}", self.probe_timeout);
            ProbeResponse::default()
        }
    }
}

fn matches_validator(current: Option<&str>, saved: Option<&str>) -> bool {
    match (current, saved) {
        (Some(current), Some(saved)) => !current.is_empty() && current == saved,
        _ => false,
    }
}

/// Report every saved page whose identifier is not in `current_identifiers`
/// as `removed` / `not_found`.
///
/// Run after all per-page checks of a pass have completed.
pub fn detect_removed(
    saved: &BTreeMap<String, PageRecord>,
    current_identifiers: &BTreeSet<String>,
) -> Vec<ChangeResult> {
    saved
        .iter()
        .filter(|(identifier, _)| !current_identifiers.contains(*identifier))
        .map(|(identifier, record)| {
            ChangeResult::new(
                record.source_url.clone(),
                identifier.clone(),
                ChangeStatus::Removed,
                ChangeReason::NotFound,
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fingerprint::page_document;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProbe(ProbeResponse);

    #[async_trait]
    impl ValidatorProbe for FixedProbe {
        async fn probe(&self, _url: &str) -> ProbeResponse {
            self.0.clone()
        }
    }

    struct StallingProbe;

    #[async_trait]
    impl ValidatorProbe for StallingProbe {
        async fn probe(&self, _url: &str) -> ProbeResponse {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ProbeResponse {
                etag: Some("\"late\"".to_string()),
                ..ProbeResponse::default()
            }
        }
    }

    struct CountingFetcher {
        document: Option<String>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn returning(document: Option<String>) -> Arc<Self> {
            Arc::new(Self {
                document,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentFetcher for CountingFetcher {
        async fn fetch_document(&self, _identifier: &str, _url: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.document.clone()
        }
    }

    const URL: &str = "https://developer.mozilla.org/en-US/docs/Web/API/Animation";

    fn saved(etag: Option<&str>, last_modified: Option<&str>) -> PageRecord {
        PageRecord::new(
            URL,
            fingerprint(&page_document("Animation", "Original body")),
            "Animation",
        )
        .with_validators(etag.map(String::from), last_modified.map(String::from))
    }

    fn probe(etag: Option<&str>, last_modified: Option<&str>) -> Arc<FixedProbe> {
        Arc::new(FixedProbe(ProbeResponse {
            etag: etag.map(String::from),
            last_modified: last_modified.map(String::from),
            status: Some(200),
        }))
    }

    #[tokio::test]
    async fn test_new_page_ignores_signals() {
        let fetcher = CountingFetcher::returning(Some("anything".to_string()));
        let detector = ChangeDetector::new(probe(Some("\"x\""), None))
            .with_content_fetcher(fetcher.clone());

        let result = detector.check("interfaces/Animation/index", URL, None).await;

        assert_eq!(result.status, ChangeStatus::New);
        assert_eq!(result.reason, ChangeReason::NewPage);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_etag_short_circuits_content_tier() {
        let fetcher =
            CountingFetcher::returning(Some(page_document("Animation", "Edited body")));
        let detector = ChangeDetector::new(probe(Some("\"v1\""), Some("Thu, 02 Jan 2025")))
            .with_content_fetcher(fetcher.clone());
        let record = saved(Some("\"v1\""), Some("Wed, 01 Jan 2025"));

        let result = detector.check("interfaces/Animation/index", URL, Some(&record)).await;

        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(result.reason, ChangeReason::Etag);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_last_modified_when_etag_differs() {
        let detector =
            ChangeDetector::new(probe(Some("\"v2\""), Some("Wed, 01 Jan 2025 00:00:00 GMT")));
        let record = saved(Some("\"v1\""), Some("Wed, 01 Jan 2025 00:00:00 GMT"));

        let result = detector.check("a", URL, Some(&record)).await;

        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(result.reason, ChangeReason::LastModified);
    }

    #[tokio::test]
    async fn test_validator_on_one_side_only_is_inconclusive() {
        let fetcher = CountingFetcher::returning(Some(page_document("Animation", "Original body")));
        let detector =
            ChangeDetector::new(probe(Some("\"v1\""), None)).with_content_fetcher(fetcher.clone());
        let record = saved(None, Some("Wed, 01 Jan 2025"));

        let result = detector.check("a", URL, Some(&record)).await;

        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(result.reason, ChangeReason::ContentHash);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_content_tier_detects_change() {
        let fetcher = CountingFetcher::returning(Some(page_document("Animation", "Edited body")));
        let detector = ChangeDetector::new(probe(None, None)).with_content_fetcher(fetcher);
        let record = saved(Some("\"v1\""), None);

        let result = detector.check("a", URL, Some(&record)).await;

        assert_eq!(result.status, ChangeStatus::Changed);
        assert_eq!(result.reason, ChangeReason::ContentHash);
    }

    #[tokio::test]
    async fn test_without_content_tier_defaults_to_changed() {
        let detector = ChangeDetector::new(probe(None, None));
        let record = saved(None, None);

        let result = detector.check("a", URL, Some(&record)).await;

        assert!(!detector.has_content_tier());
        assert_eq!(result.status, ChangeStatus::Changed);
        assert_eq!(result.reason, ChangeReason::ContentHash);
    }

    #[tokio::test]
    async fn test_failed_content_fetch_defaults_to_changed() {
        let fetcher = CountingFetcher::returning(None);
        let detector = ChangeDetector::new(probe(None, None)).with_content_fetcher(fetcher);

        let result = detector.check("a", URL, Some(&saved(None, None))).await;

        assert_eq!(result.status, ChangeStatus::Changed);
    }

    #[tokio::test]
    async fn test_probe_timeout_means_no_validators() {
        let fetcher = CountingFetcher::returning(Some(page_document("Animation", "Original body")));
        let detector = ChangeDetector::new(Arc::new(StallingProbe))
            .with_probe_timeout(Duration::from_millis(50))
            .with_content_fetcher(fetcher.clone());
        let record = saved(Some("\"late\""), None);

        let result = detector.check("a", URL, Some(&record)).await;

        assert_eq!(result.reason, ChangeReason::ContentHash);
        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detect_removed() {
        let mut pages = BTreeMap::new();
        pages.insert("guides/intro".to_string(), saved(None, None));
        pages.insert("interfaces/Gone/index".to_string(), saved(None, None));
        let current: BTreeSet<String> = ["guides/intro".to_string()].into_iter().collect();

        let removed = detect_removed(&pages, &current);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].identifier, "interfaces/Gone/index");
        assert_eq!(removed[0].status, ChangeStatus::Removed);
        assert_eq!(removed[0].reason, ChangeReason::NotFound);
        assert_eq!(removed[0].source_url, URL);
    }
}
