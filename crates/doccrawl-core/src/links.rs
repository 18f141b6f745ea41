//! Rewriting of internal markdown links into relative output paths.
//!
//! Generated pages link to each other through relative `.md` paths so the
//! output tree stays navigable offline. Only links whose target was fetched
//! in the current run are rewritten; everything else is left byte-for-byte,
//! so an untouched link means "not part of this crawl".
//!
//! ```rust
//! use doccrawl_core::links::LinkTransformer;
//!
//! let transformer = LinkTransformer::new(
//!     "https://developer.mozilla.org",
//!     ["https://developer.mozilla.org/en-US/docs/Web/API/Animation"],
//! )
//! .unwrap();
//!
//! let mapper = |url: &str| {
//!     url.ends_with("/Animation")
//!         .then(|| "interfaces/Animation/index".to_string())
//! };
//! let out = transformer.transform(
//!     "See [play](/en-US/docs/Web/API/Animation#playState).",
//!     "guides/intro",
//!     &mapper,
//! );
//! assert_eq!(out, "See [play](../interfaces/Animation/index.md#playState).");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::{Error, Result};

/// Suffix appended to identifiers to form output file names.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Inline markdown link with an optional quoted title.
///
/// Group 1 is the link text, group 2 the target.
#[allow(clippy::unwrap_used)]
static INLINE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]*)\]\(([^\s)]+)(?:\s+["']([^"']*)["'])?\)"#).unwrap()
});

/// Maps a crawled URL to the identifier of its output file.
pub trait UrlMapper: Send + Sync {
    /// Identifier for `url`, or `None` when the URL has no output file.
    fn identifier_for_url(&self, url: &str) -> Option<String>;
}

impl<F> UrlMapper for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn identifier_for_url(&self, url: &str) -> Option<String> {
        self(url)
    }
}

/// A markdown inline link as written in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Display text between the brackets.
    pub text: String,
    /// Raw target, including any query or fragment.
    pub target: String,
    /// Quoted title, if present.
    pub title: Option<String>,
}

/// Inline links in `markdown`, in document order.
pub fn extract_links(markdown: &str) -> Vec<LinkRef> {
    INLINE_LINK_RE
        .captures_iter(markdown)
        .map(|cap| LinkRef {
            text: cap[1].to_string(),
            target: cap[2].to_string(),
            title: cap.get(3).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// A link target resolved for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Absolute URL without query, fragment or a trailing slash.
    pub url: String,
    /// Fragment without the `#`, if non-empty.
    pub fragment: Option<String>,
}

/// Rewrites internal links against the set of URLs fetched in one run.
#[derive(Debug, Clone)]
pub struct LinkTransformer {
    base: Url,
    /// Canonical crawled URL to the URL as it was crawled.
    crawled: HashMap<String, String>,
}

impl LinkTransformer {
    /// Build a transformer for `base_url` and the URLs fetched in this run.
    ///
    /// When two crawled URLs canonicalize identically, the first one wins.
    pub fn new<I, S>(base_url: &str, crawled_urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut crawled = HashMap::new();
        for url in crawled_urls {
            let url = url.as_ref();
            crawled
                .entry(canonical_url(url))
                .or_insert_with(|| url.to_string());
        }

        Ok(Self { base, crawled })
    }

    /// Base URL relative targets are resolved against.
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Number of distinct crawled pages known to this transformer.
    pub fn known_pages(&self) -> usize {
        self.crawled.len()
    }

    /// Whether `target` points into the documentation site.
    ///
    /// Targets without a host are internal unless they carry a scheme
    /// (`mailto:`, `data:`); absolute targets are internal when their host
    /// and port match the base URL. Pure fragments are not links to
    /// another page and are treated as external.
    pub fn is_internal(&self, target: &str) -> bool {
        if target.is_empty() || target.starts_with('#') {
            return false;
        }
        match Url::parse(target) {
            Ok(url) => url.host_str().is_some() && self.same_site(&url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(target)
                .is_ok_and(|resolved| self.same_site(&resolved)),
            Err(_) => false,
        }
    }

    fn same_site(&self, url: &Url) -> bool {
        url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
    }

    /// Resolve an internal `target` for matching: fragment split off, query
    /// dropped, relative paths joined onto the base URL, one trailing slash
    /// removed.
    pub fn resolve(&self, target: &str) -> Option<ResolvedTarget> {
        let (without_fragment, fragment) = match target.split_once('#') {
            Some((head, frag)) => (head, (!frag.is_empty()).then(|| frag.to_string())),
            None => (target, None),
        };
        let path = without_fragment
            .split_once('?')
            .map_or(without_fragment, |(head, _)| head);

        let absolute = self.base.join(path).ok()?;
        Some(ResolvedTarget {
            url: strip_trailing_slash(absolute.as_str()).to_string(),
            fragment,
        })
    }

    /// The crawled URL `target` refers to, if any.
    pub fn matched_url(&self, target: &str) -> Option<&str> {
        if !self.is_internal(target) {
            return None;
        }
        let resolved = self.resolve(target)?;
        self.crawled.get(&resolved.url).map(String::as_str)
    }

    /// Rewrite internal links in `markdown` for a file written as
    /// `current_identifier`.
    ///
    /// Matched links become `[text](relative/path.md#fragment)`; their title
    /// is dropped. Unmatched links, external links and links the mapper has
    /// no identifier for are emitted unchanged, title included.
    pub fn transform(
        &self,
        markdown: &str,
        current_identifier: &str,
        mapper: &dyn UrlMapper,
    ) -> String {
        INLINE_LINK_RE
            .replace_all(markdown, |cap: &Captures<'_>| {
                self.rewrite(cap, current_identifier, mapper)
                    .unwrap_or_else(|| cap[0].to_string())
            })
            .into_owned()
    }

    fn rewrite(
        &self,
        cap: &Captures<'_>,
        current_identifier: &str,
        mapper: &dyn UrlMapper,
    ) -> Option<String> {
        let target = &cap[2];
        let matched = self.matched_url(target)?;
        let target_identifier = mapper.identifier_for_url(matched)?;
        let fragment = self.resolve(target)?.fragment;

        let mut relative = compute_relative_path(current_identifier, &target_identifier);
        if let Some(fragment) = fragment {
            relative.push('#');
            relative.push_str(&fragment);
        }
        Some(format!("[{}]({relative})", &cap[1]))
    }
}

fn canonical_url(url: &str) -> String {
    let parsed = Url::parse(url).map_or_else(|_| url.to_string(), |u| u.to_string());
    strip_trailing_slash(&parsed).to_string()
}

fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Relative path from the file `from` to the file `to`, both identifiers.
///
/// The last segment of each identifier is the file name; the remaining
/// segments are directories.
///
/// ```rust
/// use doccrawl_core::links::compute_relative_path;
///
/// assert_eq!(
///     compute_relative_path("guides/intro", "interfaces/Animation/index"),
///     "../interfaces/Animation/index.md"
/// );
/// assert_eq!(compute_relative_path("guides/intro", "guides/setup"), "setup.md");
/// ```
pub fn compute_relative_path(from: &str, to: &str) -> String {
    let from_parts: Vec<&str> = from.split('/').collect();
    let to_parts: Vec<&str> = to.split('/').collect();
    let from_dirs = &from_parts[..from_parts.len() - 1];
    let to_dirs = &to_parts[..to_parts.len() - 1];

    let common = from_dirs
        .iter()
        .zip(to_dirs)
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dirs.len() - common;

    let mut parts: Vec<&str> = std::iter::repeat_n("..", ups).collect();
    parts.extend_from_slice(&to_parts[common..]);
    format!("{}{MARKDOWN_SUFFIX}", parts.join("/"))
}

/// Identifier reached by following `relative` from the file `from`.
///
/// Inverse of [`compute_relative_path`]. Any fragment is ignored. Returns
/// `None` when the path climbs above the output root or is not a markdown
/// file.
pub fn resolve_relative_path(from: &str, relative: &str) -> Option<String> {
    let path = relative.split_once('#').map_or(relative, |(head, _)| head);
    let path = path.strip_suffix(MARKDOWN_SUFFIX)?;

    let mut segments: Vec<&str> = from.split('/').collect();
    segments.pop();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop()?;
            },
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
