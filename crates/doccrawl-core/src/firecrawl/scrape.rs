//! `firecrawl scrape` invocation and output parsing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{instrument, warn};

use super::FirecrawlCli;
use crate::crawl::{FetchOptions, ScrapedPage, Scraper};
use crate::{Error, Result};

/// JSON printed by `firecrawl scrape --json`.
///
/// Title and description appear either at the top level or under
/// `metadata`; top-level values win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutput {
    /// Page content as markdown.
    #[serde(default)]
    pub markdown: String,
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Meta description.
    #[serde(default)]
    pub description: Option<String>,
    /// HTTP status of the page.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Nested page metadata.
    #[serde(default)]
    pub metadata: Option<ScrapeMetadata>,
}

/// `metadata` object of [`ScrapeOutput`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Meta description.
    #[serde(default)]
    pub description: Option<String>,
    /// HTTP status of the page.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// `ETag` response header, when reported.
    #[serde(default)]
    pub etag: Option<String>,
    /// `Last-Modified` response header, when reported.
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl ScrapeOutput {
    fn status_code(&self) -> Option<u16> {
        self.status_code
            .or_else(|| self.metadata.as_ref().and_then(|m| m.status_code))
    }

    fn into_page(self) -> ScrapedPage {
        let metadata = self.metadata.unwrap_or_default();
        let mut response_headers = BTreeMap::new();
        if let Some(etag) = metadata.etag {
            response_headers.insert("etag".to_string(), etag);
        }
        if let Some(last_modified) = metadata.last_modified {
            response_headers.insert("last-modified".to_string(), last_modified);
        }

        ScrapedPage {
            markdown: self.markdown,
            title: self.title.or(metadata.title),
            description: self.description.or(metadata.description),
            response_headers,
        }
    }
}

/// Arguments for `firecrawl` rendering `url` with `options`.
///
/// ```rust
/// use doccrawl_core::crawl::FetchOptions;
/// use doccrawl_core::firecrawl::build_scrape_args;
///
/// let options = FetchOptions::default()
///     .with_excluded_tags(vec!["nav".into(), "footer".into()]);
/// assert_eq!(
///     build_scrape_args("https://a.test", &options),
///     [
///         "scrape", "https://a.test", "-f", "markdown", "--json",
///         "--only-main-content", "--exclude-tags", "nav,footer",
///     ]
/// );
/// ```
pub fn build_scrape_args(url: &str, options: &FetchOptions) -> Vec<String> {
    let mut args: Vec<String> = ["scrape", url, "-f", "markdown", "--json"]
        .into_iter()
        .map(String::from)
        .collect();
    if options.only_main_content {
        args.push("--only-main-content".to_string());
    }
    if !options.excluded_tags.is_empty() {
        args.push("--exclude-tags".to_string());
        args.push(options.excluded_tags.join(","));
    }
    args
}

impl FirecrawlCli {
    /// Render `url` to markdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FirecrawlScrapeFailed`] when the command fails, times
    /// out, prints unparseable output, or reports an HTTP error status.
    #[instrument(level = "debug", skip(self, options), fields(url = %url))]
    pub async fn scrape(&self, url: &str, options: &FetchOptions) -> Result<ScrapeOutput> {
        let args = build_scrape_args(url, options);
        tracing::debug!(path = %self.path(), ?args, "Executing firecrawl scrape command");

        let output = tokio::time::timeout(options.page_timeout, self.execute_command(&args))
            .await
            .map_err(|_| Error::FirecrawlScrapeFailed {
                url: url.to_string(),
                reason: format!("timed out after {}s", options.page_timeout.as_secs()),
            })?
            .map_err(|e| Error::FirecrawlScrapeFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let result: ScrapeOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            warn!(
                error = %e,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Failed to parse firecrawl scrape output"
            );
            Error::FirecrawlScrapeFailed {
                url: url.to_string(),
                reason: format!("failed to parse output: {e}"),
            }
        })?;

        if let Some(status) = result.status_code().filter(|s| *s >= 400) {
            return Err(Error::FirecrawlScrapeFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        Ok(result)
    }

    async fn execute_command(&self, args: &[String]) -> Result<std::process::Output> {
        let output = Command::new(self.path())
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                exit_code = ?output.status.code(),
                stderr = %stderr,
                "Firecrawl command failed"
            );
            return Err(Error::FirecrawlCommandFailed(stderr.trim().to_string()));
        }

        Ok(output)
    }
}

#[async_trait]
impl Scraper for FirecrawlCli {
    async fn scrape(&self, url: &str, options: &FetchOptions) -> Result<ScrapedPage> {
        Self::scrape(self, url, options).await.map(ScrapeOutput::into_page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_optional_flags() {
        let options = FetchOptions::default().with_main_content_only(false);
        assert_eq!(
            build_scrape_args("https://example.com", &options),
            vec!["scrape", "https://example.com", "-f", "markdown", "--json"]
        );
    }

    #[test]
    fn test_output_flat_fields() {
        let output: ScrapeOutput = serde_json::from_str(
            r##"{"markdown":"# Hi","title":"Hi","description":"d","url":"https://a","statusCode":200}"##,
        )
        .unwrap();
        assert_eq!(output.status_code(), Some(200));
        let page = output.into_page();
        assert_eq!(page.markdown, "# Hi");
        assert_eq!(page.title.as_deref(), Some("Hi"));
        assert_eq!(page.description.as_deref(), Some("d"));
        assert!(page.response_headers.is_empty());
    }

    #[test]
    fn test_output_nested_metadata() {
        let output: ScrapeOutput = serde_json::from_str(
            r#"{
                "markdown": "body",
                "metadata": {
                    "title": "Animation - Web APIs | MDN",
                    "statusCode": 404,
                    "etag": "\"x\"",
                    "lastModified": "Tue, 02 Jan 2024 00:00:00 GMT"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(output.status_code(), Some(404));
        let page = output.into_page();
        assert_eq!(page.title.as_deref(), Some("Animation - Web APIs | MDN"));
        assert_eq!(page.response_headers["etag"], "\"x\"");
        assert_eq!(page.response_headers["last-modified"], "Tue, 02 Jan 2024 00:00:00 GMT");
    }

    #[test]
    fn test_output_minimal_and_nulls() {
        let output: ScrapeOutput =
            serde_json::from_str(r#"{"markdown":"","title":null,"metadata":null}"#).unwrap();
        let page = output.into_page();
        assert!(page.markdown.is_empty());
        assert!(page.title.is_none());
    }
}
