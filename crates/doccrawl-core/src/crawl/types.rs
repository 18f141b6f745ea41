use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Settings passed to the page-rendering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Per-page timeout.
    pub page_timeout: Duration,
    /// HTML tags dropped before markdown conversion.
    pub excluded_tags: Vec<String>,
    /// Extract the main content only.
    pub only_main_content: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(30),
            excluded_tags: Vec::new(),
            only_main_content: true,
        }
    }
}

impl FetchOptions {
    /// Set the per-page timeout.
    #[must_use]
    pub const fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Set the excluded tags.
    #[must_use]
    pub fn with_excluded_tags(mut self, tags: Vec<String>) -> Self {
        self.excluded_tags = tags;
        self
    }

    /// Set main-content extraction.
    #[must_use]
    pub const fn with_main_content_only(mut self, only_main: bool) -> Self {
        self.only_main_content = only_main;
        self
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawledPage {
    /// URL as requested.
    pub url: String,
    /// Page content as markdown.
    pub markdown: String,
    /// Document title, if the engine found one.
    pub title: Option<String>,
    /// Meta description, if the engine found one.
    pub description: Option<String>,
    /// Absolute same-host links found in the content, without fragments.
    pub internal_links: Vec<String>,
    /// Response headers, names lowercased.
    pub response_headers: BTreeMap<String, String>,
}

impl CrawledPage {
    /// `ETag` response header.
    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }

    /// `Last-Modified` response header.
    pub fn last_modified(&self) -> Option<&str> {
        self.header("last-modified")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Result of fetching one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was rendered.
    Success(CrawledPage),
    /// The page could not be rendered.
    Failure {
        /// Failure description.
        error: String,
    },
}

impl FetchOutcome {
    /// The page, when the fetch succeeded.
    pub const fn page(&self) -> Option<&CrawledPage> {
        match self {
            Self::Success(page) => Some(page),
            Self::Failure { .. } => None,
        }
    }

    /// Consume into the page, when the fetch succeeded.
    pub fn into_page(self) -> Option<CrawledPage> {
        match self {
            Self::Success(page) => Some(page),
            Self::Failure { .. } => None,
        }
    }
}

/// Fetches and renders many pages.
///
/// Individual failures are reported per URL; the batch itself never fails.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch every URL in `urls`. The result has one entry per distinct URL.
    async fn fetch_many(
        &self,
        urls: &[String],
        options: &FetchOptions,
    ) -> BTreeMap<String, FetchOutcome>;
}
