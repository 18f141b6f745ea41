use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::Result;
use crate::cleaner::ContentCleaner;
use crate::config::ResolvedSource;
use crate::crawl::{CrawledPage, FetchOptions, PageFetcher};
use crate::detect::ContentFetcher;
use crate::fingerprint::{fingerprint, page_document};
use crate::links::{LinkTransformer, UrlMapper};

/// A page ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Output identifier.
    pub identifier: String,
    /// Source URL.
    pub url: String,
    /// Cleaned title.
    pub title: String,
    /// Cleaned body with links rewritten, trimmed.
    pub markdown: String,
    /// Fingerprint of [`document`](Self::document).
    pub fingerprint: String,
    /// `ETag` seen when the page was fetched.
    pub etag: Option<String>,
    /// `Last-Modified` seen when the page was fetched.
    pub last_modified: Option<String>,
}

impl RenderedPage {
    /// The canonical document: heading plus body.
    pub fn document(&self) -> String {
        page_document(&self.title, &self.markdown)
    }
}

/// Turns fetched pages into their canonical rendered form.
///
/// Generation and the content tier of remote change detection share one
/// renderer so both produce identical fingerprints for identical input.
#[derive(Clone)]
pub struct PageRenderer {
    cleaner: Arc<dyn ContentCleaner>,
    mapper: Arc<dyn UrlMapper>,
    title_suffix: Option<Regex>,
    links: Option<LinkTransformer>,
}

impl PageRenderer {
    /// Renderer with no title cleanup and no link rewriting.
    pub fn new(cleaner: Arc<dyn ContentCleaner>, mapper: Arc<dyn UrlMapper>) -> Self {
        Self {
            cleaner,
            mapper,
            title_suffix: None,
            links: None,
        }
    }

    /// Renderer configured for `source`, rewriting links that point at any
    /// of `crawled_urls` when link rewriting is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) when the
    /// source's base URL does not parse.
    pub fn for_source<I, S>(source: &ResolvedSource, crawled_urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut renderer = Self::new(
            Arc::clone(&source.profile.cleaner),
            Arc::clone(&source.profile.mapper),
        )
        .with_title_suffix(source.title_suffix.clone());
        if source.transform_links {
            renderer = renderer.with_links(LinkTransformer::new(&source.base_url, crawled_urls)?);
        }
        Ok(renderer)
    }

    /// Remove matches of `pattern` from titles.
    #[must_use]
    pub fn with_title_suffix(mut self, pattern: Option<Regex>) -> Self {
        self.title_suffix = pattern;
        self
    }

    /// Rewrite internal links with `transformer`.
    #[must_use]
    pub fn with_links(mut self, transformer: LinkTransformer) -> Self {
        self.links = Some(transformer);
        self
    }

    /// Output identifier for `url`.
    pub fn identifier_for(&self, url: &str) -> Option<String> {
        self.mapper.identifier_for_url(url)
    }

    /// Title for a page: the scraped title with the suffix pattern removed
    /// and trimmed, or the last identifier segment when that is empty.
    pub fn clean_title(&self, raw: Option<&str>, identifier: &str) -> String {
        let fallback = identifier.rsplit('/').next().unwrap_or(identifier);
        let raw = raw.filter(|t| !t.trim().is_empty()).unwrap_or(fallback);
        let cleaned = self
            .title_suffix
            .as_ref()
            .map_or_else(|| raw.to_string(), |re| re.replace_all(raw, "").into_owned());
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            fallback.to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// Render `page`, or `None` when its URL has no identifier.
    pub fn render(&self, page: &CrawledPage) -> Option<RenderedPage> {
        let identifier = self.identifier_for(&page.url)?;
        let title = self.clean_title(page.title.as_deref(), &identifier);

        let cleaned = self.cleaner.clean(&page.markdown, &title);
        let markdown = self
            .links
            .as_ref()
            .map_or(cleaned.clone(), |links| {
                links.transform(&cleaned, &identifier, self.mapper.as_ref())
            })
            .trim()
            .to_string();

        let fingerprint = fingerprint(&page_document(&title, &markdown));
        Some(RenderedPage {
            identifier,
            url: page.url.clone(),
            title,
            markdown,
            fingerprint,
            etag: page.etag().map(ToString::to_string),
            last_modified: page.last_modified().map(ToString::to_string),
        })
    }
}

/// Content tier for remote change detection: fetch a page and render it
/// exactly as generation would.
pub struct RenderedContentFetcher {
    fetcher: Arc<dyn PageFetcher>,
    renderer: PageRenderer,
    options: FetchOptions,
}

impl RenderedContentFetcher {
    /// Fetch with `fetcher` and `options`, render with `renderer`.
    pub fn new(fetcher: Arc<dyn PageFetcher>, renderer: PageRenderer, options: FetchOptions) -> Self {
        Self {
            fetcher,
            renderer,
            options,
        }
    }
}

#[async_trait]
impl ContentFetcher for RenderedContentFetcher {
    async fn fetch_document(&self, identifier: &str, url: &str) -> Option<String> {
        let mut results = self
            .fetcher
            .fetch_many(&[url.to_string()], &self.options)
            .await;
        let page = results.remove(url)?.into_page()?;
        let rendered = self.renderer.render(&page)?;
        if rendered.identifier != identifier {
            tracing::debug!(
                "{url} now maps to {} instead of {identifier}",
                rendered.identifier
            );
        }
        Some(rendered.document())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cleaner::BaseCleaner;
    use crate::crawl::FetchOutcome;
    use crate::sources::path_identifier;
    use std::collections::BTreeMap;

    fn page(url: &str, title: Option<&str>, markdown: &str) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            markdown: markdown.to_string(),
            title: title.map(ToString::to_string),
            description: None,
            internal_links: Vec::new(),
            response_headers: BTreeMap::from([("etag".to_string(), "\"v1\"".to_string())]),
        }
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(Arc::new(BaseCleaner), Arc::new(path_identifier))
            .with_title_suffix(Some(Regex::new(r"\s*\|\s*Site$").unwrap()))
    }

    #[test]
    fn test_title_cleanup_and_fallback() {
        let r = renderer();
        assert_eq!(r.clean_title(Some("Intro | Site"), "guide/intro"), "Intro");
        assert_eq!(r.clean_title(Some("   "), "guide/intro"), "intro");
        assert_eq!(r.clean_title(None, "top"), "top");
        assert_eq!(r.clean_title(Some(" | Site"), "guide/setup"), "setup");
    }

    #[test]
    fn test_render_fingerprints_canonical_document() {
        let rendered = renderer()
            .render(&page("https://s.test/guide/intro", Some("Intro | Site"), "\n\nBody\n\n\n\nMore\n"))
            .unwrap();

        assert_eq!(rendered.identifier, "guide/intro");
        assert_eq!(rendered.markdown, "Body\n\nMore");
        assert_eq!(rendered.document(), "# Intro\n\nBody\n\nMore");
        assert_eq!(rendered.fingerprint, fingerprint("# Intro\n\nBody\n\nMore"));
        assert_eq!(rendered.etag.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn test_render_rewrites_links_to_crawled_pages() {
        let links = LinkTransformer::new(
            "https://s.test",
            ["https://s.test/guide/setup", "https://s.test/guide/intro"],
        )
        .unwrap();
        let r = renderer().with_links(links);

        let rendered = r
            .render(&page(
                "https://s.test/guide/intro",
                Some("Intro"),
                "See [setup](/guide/setup#top) and [other](/guide/other).",
            ))
            .unwrap();

        assert_eq!(
            rendered.markdown,
            "See [setup](setup.md#top) and [other](/guide/other)."
        );
    }

    #[test]
    fn test_unmapped_url_is_not_rendered() {
        assert!(renderer().render(&page("https://s.test/", None, "x")).is_none());
    }

    struct OnePage(CrawledPage);

    #[async_trait]
    impl PageFetcher for OnePage {
        async fn fetch_many(
            &self,
            urls: &[String],
            _options: &FetchOptions,
        ) -> BTreeMap<String, FetchOutcome> {
            urls.iter()
                .filter(|u| **u == self.0.url)
                .map(|u| (u.clone(), FetchOutcome::Success(self.0.clone())))
                .collect()
        }
    }

    #[tokio::test]
    async fn test_content_fetcher_matches_generation() {
        let source = page("https://s.test/guide/intro", Some("Intro | Site"), "Body");
        let expected = renderer().render(&source).unwrap().document();

        let fetcher = RenderedContentFetcher::new(
            Arc::new(OnePage(source)),
            renderer(),
            FetchOptions::default(),
        );

        assert_eq!(
            fetcher.fetch_document("guide/intro", "https://s.test/guide/intro").await,
            Some(expected)
        );
        assert_eq!(fetcher.fetch_document("x", "https://s.test/other").await, None);
    }
}
