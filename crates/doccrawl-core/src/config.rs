//! Per-source configuration.
//!
//! Every source directory carries a `config.toml` describing where the
//! documentation lives and how to crawl it. Values left out fall back to
//! the selected [`SourceProfile`], then to built-in defaults.
//!
//! ```toml
//! name = "MDN Web Animations API"
//! base_url = "https://developer.mozilla.org"
//! language = "en-US"
//! profile = "mdn-web-animations-api"
//!
//! [crawler]
//! max_concurrent = 5
//! discovery_depth = 1
//!
//! [output]
//! title_suffix_pattern = "\\s*[-|]\\s*(Web APIs|MDN).*$"
//! ```
//!
//! Loading and resolving against the built-in registry:
//!
//! ```rust
//! use doccrawl_core::config::{SourceConfig, SourceOverrides};
//! use doccrawl_core::sources::SourceRegistry;
//!
//! let config = SourceConfig::parse(
//!     r#"
//!     base_url = "https://developer.mozilla.org"
//!     profile = "mdn-web-animations-api"
//!     "#,
//! )?;
//! let registry = SourceRegistry::builtin();
//! let source = config.resolve("mdn", &registry, &SourceOverrides::default())?;
//!
//! assert_eq!(source.language, "en-US");
//! assert_eq!(source.max_concurrent, 5);
//! assert!(!source.seed_urls.is_empty());
//! # Ok::<(), doccrawl_core::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawl::{DiscoveryOptions, FetchOptions};
use crate::generate::IndexOptions;
use crate::sources::{GENERIC_PROFILE, SourceProfile, SourceRegistry};
use crate::{Error, Result};

/// Default language segment for language-prefixed sites.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Upper bound for concurrent page fetches.
pub const MAX_CONCURRENCY: usize = 50;

const DEFAULT_INDEX_DESCRIPTION: &str = "This documentation was extracted automatically.";

/// Contents of a source's `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name; the directory name is used when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Site root, e.g. `https://developer.mozilla.org`.
    pub base_url: String,

    /// Language segment for language-prefixed sites.
    #[serde(default = "default_language")]
    pub language: String,

    /// Registry key of the [`SourceProfile`] to use.
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Seed paths appended to `base_url`. Replaces the profile's seeds.
    #[serde(default)]
    pub seed_urls: Vec<String>,

    /// URL regexes for discovery. Replaces the profile's patterns.
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// URL regexes that drop a discovered URL even when included.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Crawler settings.
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[crawler]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Pages fetched at once.
    pub max_concurrent: usize,
    /// Per-page fetch timeout in milliseconds.
    pub page_timeout_ms: u64,
    /// HTML tags the scraper drops before conversion.
    pub excluded_tags: Vec<String>,
    /// Link levels followed during discovery; 1 crawls the seeds only.
    pub discovery_depth: usize,
    /// Validator probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Probe each generated page for `ETag` and `Last-Modified`.
    pub record_validators: bool,
    /// Ask the scraper for the main content only.
    pub only_main_content: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            page_timeout_ms: 30_000,
            excluded_tags: ["nav", "footer", "aside", "header"]
                .into_iter()
                .map(String::from)
                .collect(),
            discovery_depth: 1,
            probe_timeout_ms: 10_000,
            record_validators: true,
            only_main_content: true,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write front matter at the top of each page.
    pub frontmatter: bool,
    /// Rewrite internal links to relative `.md` paths.
    pub transform_links: bool,
    /// Regex removed from scraped titles, e.g. a site-name suffix.
    pub title_suffix_pattern: Option<String>,
    /// Index heading; defaults to `<name> Documentation`.
    pub index_title: Option<String>,
    /// Paragraph under the index heading.
    pub index_description: Option<String>,
    /// Category keys in display order. Replaces the profile's order.
    pub category_order: Vec<String>,
    /// Category display titles, merged over the profile's titles.
    pub category_titles: BTreeMap<String, String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            frontmatter: true,
            transform_links: true,
            title_suffix_pattern: None,
            index_title: None,
            index_description: None,
            category_order: Vec::new(),
            category_titles: BTreeMap::new(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_profile() -> String {
    GENERIC_PROFILE.to_string()
}

/// Command-line overrides applied on top of a config.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    /// Replaces `language`.
    pub language: Option<String>,
    /// Replaces `crawler.max_concurrent`.
    pub max_concurrent: Option<usize>,
}

impl SourceConfig {
    /// File name inside a source directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Read and validate `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be read, is not valid
    /// TOML, or fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid TOML or invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse source config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `base_url` is not an absolute URL, a
    /// pattern does not compile, or `max_concurrent` is zero.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if base.host_str().is_none() {
            return Err(Error::Config(format!(
                "base_url '{}' must include a host",
                self.base_url
            )));
        }
        compile_patterns("include_patterns", &self.include_patterns)?;
        compile_patterns("exclude_patterns", &self.exclude_patterns)?;
        if let Some(pattern) = &self.output.title_suffix_pattern {
            compile_pattern("title_suffix_pattern", pattern)?;
        }
        if self.crawler.max_concurrent == 0 {
            return Err(Error::Config("crawler.max_concurrent must be at least 1".into()));
        }
        Ok(())
    }

    /// Display name, falling back to `fallback`.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// Combine this config with its profile and `overrides`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown profile or a pattern that
    /// does not compile.
    pub fn resolve(
        &self,
        source_name: &str,
        registry: &SourceRegistry,
        overrides: &SourceOverrides,
    ) -> Result<ResolvedSource> {
        let profile = registry.get(&self.profile)?.clone();
        let language = overrides
            .language
            .clone()
            .unwrap_or_else(|| self.language.clone());
        let base_url = self.base_url.trim_end_matches('/').to_string();

        let seed_urls = if self.seed_urls.is_empty() {
            profile.seed_urls(&base_url, &language)
        } else {
            self.seed_urls
                .iter()
                .map(|path| format!("{base_url}{path}"))
                .collect()
        };
        let include = if self.include_patterns.is_empty() {
            compile_patterns("include_patterns", &profile.include_patterns)?
        } else {
            compile_patterns("include_patterns", &self.include_patterns)?
        };
        let exclude = compile_patterns("exclude_patterns", &self.exclude_patterns)?;
        let title_suffix = self
            .output
            .title_suffix_pattern
            .as_deref()
            .map(|p| compile_pattern("title_suffix_pattern", p))
            .transpose()?;

        let max_concurrent = overrides
            .max_concurrent
            .unwrap_or(self.crawler.max_concurrent)
            .clamp(1, MAX_CONCURRENCY);

        let category_order = if self.output.category_order.is_empty() {
            profile.category_order.clone()
        } else {
            self.output.category_order.clone()
        };
        let mut category_titles = profile.category_titles.clone();
        category_titles.extend(self.output.category_titles.clone());

        let display_name = self.display_name(source_name).to_string();
        let index_title = self
            .output
            .index_title
            .clone()
            .unwrap_or_else(|| format!("{display_name} Documentation"));
        let index_description = self
            .output
            .index_description
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_DESCRIPTION.to_string());

        Ok(ResolvedSource {
            name: source_name.to_string(),
            display_name,
            base_url,
            language,
            seed_urls,
            include,
            exclude,
            max_concurrent,
            page_timeout: Duration::from_millis(self.crawler.page_timeout_ms),
            probe_timeout: Duration::from_millis(self.crawler.probe_timeout_ms),
            excluded_tags: self.crawler.excluded_tags.clone(),
            discovery_depth: self.crawler.discovery_depth.max(1),
            record_validators: self.crawler.record_validators,
            only_main_content: self.crawler.only_main_content,
            frontmatter: self.output.frontmatter,
            transform_links: self.output.transform_links,
            title_suffix,
            index_title,
            index_description,
            category_order,
            category_titles,
            profile,
        })
    }
}

/// A config merged with its profile and command-line overrides.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Directory name of the source.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Site root without a trailing slash.
    pub base_url: String,
    /// Effective language.
    pub language: String,
    /// Absolute seed URLs.
    pub seed_urls: Vec<String>,
    /// Compiled include patterns.
    pub include: Vec<Regex>,
    /// Compiled exclude patterns.
    pub exclude: Vec<Regex>,
    /// Effective concurrency, within `1..=MAX_CONCURRENCY`.
    pub max_concurrent: usize,
    /// Per-page fetch timeout.
    pub page_timeout: Duration,
    /// Validator probe timeout.
    pub probe_timeout: Duration,
    /// Tags the scraper drops.
    pub excluded_tags: Vec<String>,
    /// Discovery depth, at least 1.
    pub discovery_depth: usize,
    /// Probe generated pages for validators.
    pub record_validators: bool,
    /// Main content only.
    pub only_main_content: bool,
    /// Write front matter.
    pub frontmatter: bool,
    /// Rewrite internal links.
    pub transform_links: bool,
    /// Compiled title suffix pattern.
    pub title_suffix: Option<Regex>,
    /// Index heading.
    pub index_title: String,
    /// Index description paragraph.
    pub index_description: String,
    /// Category display order.
    pub category_order: Vec<String>,
    /// Category display titles.
    pub category_titles: BTreeMap<String, String>,
    /// The selected profile.
    pub profile: SourceProfile,
}

impl ResolvedSource {
    /// Identifier to URL for the profile's known pages.
    pub fn known_urls(&self) -> BTreeMap<String, String> {
        self.profile.known_urls(&self.base_url, &self.language)
    }

    /// Engine settings for every page fetch of this source.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_page_timeout(self.page_timeout)
            .with_excluded_tags(self.excluded_tags.clone())
            .with_main_content_only(self.only_main_content)
    }

    /// Discovery starting at the seed URLs.
    pub fn discovery_options(&self) -> DiscoveryOptions {
        let mut options = DiscoveryOptions::new(self.seed_urls.clone());
        options.include = self.include.clone();
        options.exclude = self.exclude.clone();
        options.language = self.language.clone();
        options.depth = self.discovery_depth;
        options.fetch = self.fetch_options();
        options.normalizer = self.profile.normalizer.clone();
        options
    }

    /// Heading and category layout of `index.md`.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            title: self.index_title.clone(),
            description: self.index_description.clone(),
            category_order: self.category_order.clone(),
            category_titles: self.category_titles.clone(),
        }
    }
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("Invalid {field} '{pattern}': {e}")))
}

fn compile_patterns(field: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile_pattern(field, p)).collect()
}
