//! Link-following URL discovery.

use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, instrument};

use super::types::{FetchOptions, PageFetcher};
use crate::events::{CrawlEvent, EventSink};
use crate::sources::UrlNormalizer;

/// What to crawl during discovery and which links to keep.
#[derive(Clone)]
pub struct DiscoveryOptions {
    /// Absolute URLs fetched at level 1.
    pub seeds: Vec<String>,
    /// A link is kept when it matches any of these. Empty keeps every
    /// internal link.
    pub include: Vec<Regex>,
    /// A kept link is dropped again when it matches any of these.
    pub exclude: Vec<Regex>,
    /// Language passed to the normalizer.
    pub language: String,
    /// Levels to crawl; 1 fetches the seeds only.
    pub depth: usize,
    /// Engine settings for every discovery fetch.
    pub fetch: FetchOptions,
    /// Rewrite applied to kept links.
    pub normalizer: Option<Arc<dyn UrlNormalizer>>,
}

impl DiscoveryOptions {
    /// Options for `seeds` with no filters at depth 1.
    #[must_use]
    pub fn new(seeds: Vec<String>) -> Self {
        Self {
            seeds,
            include: Vec::new(),
            exclude: Vec::new(),
            language: String::new(),
            depth: 1,
            fetch: FetchOptions::default(),
            normalizer: None,
        }
    }

    /// Whether a discovered link passes the include and exclude filters.
    pub fn accepts(&self, url: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(url));
        included && !self.exclude.iter().any(|re| re.is_match(url))
    }

    fn normalize(&self, url: &str) -> String {
        self.normalizer
            .as_ref()
            .map_or_else(|| url.to_string(), |n| n.normalize(url, &self.language))
    }
}

/// Crawl the seeds and collect the internal links that pass the filters,
/// following newly found links for `depth - 1` further levels.
///
/// Seeds that were fetched successfully are part of the result. Seeds that
/// failed are not, and neither are their links.
#[instrument(level = "debug", skip_all, fields(seeds = options.seeds.len(), depth = options.depth))]
pub async fn discover_urls(
    fetcher: &dyn PageFetcher,
    options: &DiscoveryOptions,
    events: &dyn EventSink,
) -> BTreeSet<String> {
    let mut discovered = BTreeSet::new();
    let mut crawled = BTreeSet::new();
    let mut frontier: Vec<String> = options.seeds.clone();

    for level in 1..=options.depth.max(1) {
        frontier.retain(|url| !crawled.contains(url));
        frontier.sort();
        frontier.dedup();
        if frontier.is_empty() {
            debug!("Discovery level {level}: nothing left to crawl");
            break;
        }

        events.emit(CrawlEvent::DiscoveryLevel {
            level,
            urls: frontier.len(),
        });
        let results = fetcher.fetch_many(&frontier, &options.fetch).await;
        crawled.extend(frontier.drain(..));

        let mut new_urls = 0;
        for (url, outcome) in results {
            let Some(page) = outcome.into_page() else {
                continue;
            };
            if discovered.insert(url) {
                new_urls += 1;
            }
            for link in &page.internal_links {
                if !options.accepts(link) {
                    continue;
                }
                let link = options.normalize(link);
                if discovered.insert(link.clone()) {
                    new_urls += 1;
                    frontier.push(link);
                }
            }
        }

        events.emit(CrawlEvent::DiscoveryLevelDone { level, new_urls });
    }

    debug!("Discovered {} URLs", discovered.len());
    discovered
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::crawl::{CrawledPage, FetchOutcome};
    use crate::events::NullSink;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    /// Serves a fixed link graph and records every batch.
    struct GraphFetcher {
        links: HashMap<String, Vec<String>>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl GraphFetcher {
        fn new(edges: &[(&str, &[&str])]) -> Self {
            Self {
                links: edges
                    .iter()
                    .map(|(from, to)| {
                        ((*from).to_string(), to.iter().map(|s| (*s).to_string()).collect())
                    })
                    .collect(),
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for GraphFetcher {
        async fn fetch_many(
            &self,
            urls: &[String],
            _options: &FetchOptions,
        ) -> BTreeMap<String, FetchOutcome> {
            self.batches.lock().unwrap().push(urls.to_vec());
            urls.iter()
                .map(|url| {
                    let outcome = self.links.get(url).map_or_else(
                        || FetchOutcome::Failure {
                            error: "404".to_string(),
                        },
                        |links| {
                            FetchOutcome::Success(CrawledPage {
                                url: url.clone(),
                                markdown: String::new(),
                                title: None,
                                description: None,
                                internal_links: links.clone(),
                                response_headers: BTreeMap::new(),
                            })
                        },
                    );
                    (url.clone(), outcome)
                })
                .collect()
        }
    }

    fn graph() -> GraphFetcher {
        GraphFetcher::new(&[
            ("https://s.test/en/api/A", &["https://s.test/en/api/A/m", "https://s.test/blog/x"]),
            ("https://s.test/en/api/A/m", &["https://s.test/en/api/A/deep"]),
            ("https://s.test/en/api/A/deep", &[]),
        ])
    }

    fn options(depth: usize) -> DiscoveryOptions {
        let mut options = DiscoveryOptions::new(vec![
            "https://s.test/en/api/A".to_string(),
            "https://s.test/en/api/missing".to_string(),
        ]);
        options.include = vec![Regex::new("/api/").unwrap()];
        options.depth = depth;
        options
    }

    #[tokio::test]
    async fn test_depth_one_collects_seed_links() {
        let fetcher = graph();
        let found = discover_urls(&fetcher, &options(1), &NullSink).await;

        let expected: BTreeSet<String> = ["https://s.test/en/api/A", "https://s.test/en/api/A/m"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
        assert_eq!(fetcher.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deeper_levels_follow_new_links_once() {
        let fetcher = graph();
        let found = discover_urls(&fetcher, &options(5), &NullSink).await;

        assert!(found.contains("https://s.test/en/api/A/deep"));
        assert!(!found.contains("https://s.test/blog/x"));
        assert!(!found.contains("https://s.test/en/api/missing"));

        let batches = fetcher.batches.lock().unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1], vec!["https://s.test/en/api/A/m"]);
        assert_eq!(batches[2], vec!["https://s.test/en/api/A/deep"]);
    }

    #[tokio::test]
    async fn test_exclude_and_normalize() {
        let fetcher = graph();
        let mut opts = options(1);
        opts.exclude = vec![Regex::new("/m$").unwrap()];
        let found = discover_urls(&fetcher, &opts, &NullSink).await;
        assert_eq!(found.len(), 1);

        let mut opts = options(1);
        opts.language = "fr".to_string();
        opts.normalizer = Some(Arc::new(|url: &str, lang: &str| url.replace("/en/", &format!("/{lang}/"))));
        let found = discover_urls(&graph(), &opts, &NullSink).await;
        assert!(found.contains("https://s.test/fr/api/A/m"));
        assert!(found.contains("https://s.test/en/api/A"));
    }

    #[test]
    fn test_empty_include_accepts_everything() {
        let mut opts = DiscoveryOptions::new(Vec::new());
        assert!(opts.accepts("https://s.test/anything"));
        opts.exclude = vec![Regex::new("anything").unwrap()];
        assert!(!opts.accepts("https://s.test/anything"));
    }
}
