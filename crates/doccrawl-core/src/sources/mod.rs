//! Built-in source profiles.
//!
//! A profile bundles everything site-specific about a documentation source:
//! which discovered URLs belong to it, where the crawl starts, which pages
//! are always fetched, how scraped markdown is cleaned, and how URLs map to
//! output identifiers. Profiles are plain data records registered in
//! [`SourceRegistry::builtin`]; a source's `config.toml` selects one by name.

mod mdn;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::cleaner::{BaseCleaner, ContentCleaner};
use crate::links::UrlMapper;
use crate::{Error, Result};

pub use mdn::{MDN_PROFILE, MdnUrlMapper, normalize_mdn_url};

/// Name of the profile used when a config does not select one.
pub const GENERIC_PROFILE: &str = "generic";

/// Rewrites a discovered URL for the selected language.
pub trait UrlNormalizer: Send + Sync {
    /// Normalized form of `url` for `language`.
    fn normalize(&self, url: &str, language: &str) -> String;
}

impl<F> UrlNormalizer for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn normalize(&self, url: &str, language: &str) -> String {
        self(url, language)
    }
}

/// Site-specific behavior for one documentation source.
#[derive(Clone)]
pub struct SourceProfile {
    /// Registry key.
    pub name: String,
    /// Regexes a discovered URL must match (any of).
    pub include_patterns: Vec<String>,
    /// Seed paths below the language root.
    pub seed_paths: Vec<String>,
    /// Identifier to path below the language root, always crawled.
    pub known_pages: Vec<(String, String)>,
    /// Whether page URLs carry a `/<language>` prefix after the host.
    pub language_prefixed: bool,
    /// Index category keys in display order.
    pub category_order: Vec<String>,
    /// Display titles for index categories.
    pub category_titles: BTreeMap<String, String>,
    /// Markdown cleanup for scraped pages.
    pub cleaner: Arc<dyn ContentCleaner>,
    /// URL to output identifier mapping.
    pub mapper: Arc<dyn UrlMapper>,
    /// Optional rewrite applied to every discovered URL.
    pub normalizer: Option<Arc<dyn UrlNormalizer>>,
}

impl fmt::Debug for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceProfile")
            .field("name", &self.name)
            .field("include_patterns", &self.include_patterns)
            .field("seed_paths", &self.seed_paths)
            .field("known_pages", &self.known_pages.len())
            .field("language_prefixed", &self.language_prefixed)
            .field("has_normalizer", &self.normalizer.is_some())
            .finish_non_exhaustive()
    }
}

impl SourceProfile {
    /// The generic profile: base cleanup, identifiers taken from URL paths.
    #[must_use]
    pub fn generic() -> Self {
        Self {
            name: GENERIC_PROFILE.to_string(),
            include_patterns: Vec::new(),
            seed_paths: Vec::new(),
            known_pages: Vec::new(),
            language_prefixed: false,
            category_order: Vec::new(),
            category_titles: BTreeMap::new(),
            cleaner: Arc::new(BaseCleaner),
            mapper: Arc::new(path_identifier),
            normalizer: None,
        }
    }

    /// Absolute URL for a path below the language root.
    pub fn page_url(&self, base_url: &str, language: &str, path: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if self.language_prefixed {
            format!("{base}/{language}{path}")
        } else {
            format!("{base}{path}")
        }
    }

    /// Seed URLs for `language`.
    pub fn seed_urls(&self, base_url: &str, language: &str) -> Vec<String> {
        self.seed_paths
            .iter()
            .map(|path| self.page_url(base_url, language, path))
            .collect()
    }

    /// Identifier to absolute URL for every known page.
    pub fn known_urls(&self, base_url: &str, language: &str) -> BTreeMap<String, String> {
        self.known_pages
            .iter()
            .map(|(identifier, path)| {
                (identifier.clone(), self.page_url(base_url, language, path))
            })
            .collect()
    }

    /// Apply the profile's normalizer, if any.
    pub fn normalize(&self, url: &str, language: &str) -> String {
        self.normalizer
            .as_ref()
            .map_or_else(|| url.to_string(), |n| n.normalize(url, language))
    }

    /// Output identifier for `url`.
    pub fn identifier_for(&self, url: &str) -> Option<String> {
        self.mapper.identifier_for_url(url)
    }
}

/// Identifier derived from the URL path with surrounding slashes removed.
///
/// ```rust
/// use doccrawl_core::sources::path_identifier;
///
/// assert_eq!(
///     path_identifier("https://docs.rs/tokio/latest/"),
///     Some("tokio/latest".to_string())
/// );
/// assert_eq!(path_identifier("https://docs.rs/"), None);
/// ```
pub fn path_identifier(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path().trim_matches('/');
    (!path.is_empty()).then(|| path.to_string())
}

/// Lookup table of known profiles.
#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
    profiles: BTreeMap<String, SourceProfile>,
}

impl SourceRegistry {
    /// Registry containing every built-in profile.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(SourceProfile::generic());
        registry.register(mdn::profile());
        registry
    }

    /// Add or replace a profile.
    pub fn register(&mut self, profile: SourceProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Profile registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no profile has that name.
    pub fn get(&self, name: &str) -> Result<&SourceProfile> {
        self.profiles.get(name).ok_or_else(|| {
            Error::Config(format!(
                "Unknown source profile '{name}' (available: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Registered profile names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
