use std::collections::HashSet;

use url::Url;

use crate::links::extract_links;

/// Absolute same-host link targets in `markdown`, resolved against
/// `page_url`, with fragments removed, in first-seen order.
///
/// ```rust
/// use doccrawl_core::crawl::internal_links;
///
/// let md = "[a](/docs/A#x) [b](https://other.test/b) [c](#top) [d](../B)";
/// assert_eq!(
///     internal_links("https://site.test/docs/guide/", md),
///     vec!["https://site.test/docs/A", "https://site.test/docs/B"]
/// );
/// ```
pub fn internal_links(page_url: &str, markdown: &str) -> Vec<String> {
    let Ok(page) = Url::parse(page_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    extract_links(markdown)
        .into_iter()
        .filter(|link| !link.target.starts_with('#'))
        .filter_map(|link| page.join(&link.target).ok())
        .filter(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str() == page.host_str()
                && url.port_or_known_default() == page.port_or_known_default()
        })
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
