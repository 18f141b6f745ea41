use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::writer::yaml_string;
use crate::Result;
use crate::detect::INDEX_FILE;
use crate::links::MARKDOWN_SUFFIX;

/// Category of pages whose identifier has a single segment.
pub const MAIN_CATEGORY: &str = "main";

/// Category an identifier is listed under: its first segment, or
/// [`MAIN_CATEGORY`] for single-segment identifiers.
///
/// ```rust
/// use doccrawl_core::generate::category_for;
///
/// assert_eq!(category_for("guides/Tips"), "guides");
/// assert_eq!(category_for("Web_Animations_API"), "main");
/// ```
pub fn category_for(identifier: &str) -> &str {
    match identifier.split_once('/') {
        Some((first, _)) => first,
        None => MAIN_CATEGORY,
    }
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    /// Link text.
    pub title: String,
    /// Link target relative to the output directory.
    pub path: String,
    /// Source URL.
    pub url: String,
}

/// Pages grouped by category for the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteIndex {
    categories: BTreeMap<String, Vec<IndexEntry>>,
}

impl SiteIndex {
    /// Add the page written as `identifier`.
    pub fn add(&mut self, identifier: &str, title: &str, url: &str) {
        self.categories
            .entry(category_for(identifier).to_string())
            .or_default()
            .push(IndexEntry {
                title: title.to_string(),
                path: format!("{identifier}{MARKDOWN_SUFFIX}"),
                url: url.to_string(),
            });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether no entries were added.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Entries of `category`, in insertion order.
    pub fn entries(&self, category: &str) -> &[IndexEntry] {
        self.categories.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Categories in display order: those in `order` first, then the rest
    /// alphabetically.
    pub fn ordered_categories<'a>(&'a self, order: &'a [String]) -> Vec<&'a str> {
        let mut listed = BTreeSet::new();
        let mut categories = Vec::new();
        for category in order {
            if self.categories.contains_key(category) && listed.insert(category.as_str()) {
                categories.push(category.as_str());
            }
        }
        categories.extend(
            self.categories
                .keys()
                .map(String::as_str)
                .filter(|c| !listed.contains(c)),
        );
        categories
    }
}

/// Heading and layout settings for the index.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Page heading.
    pub title: String,
    /// Paragraph under the heading.
    pub description: String,
    /// Category keys listed first, in this order.
    pub category_order: Vec<String>,
    /// Display titles per category key.
    pub category_titles: BTreeMap<String, String>,
}

/// `guides` becomes `Guides`, `web_apis` becomes `Web Apis`.
fn category_display(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut previous_alpha = false;
    for ch in key.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }
    out
}

/// Index document for `index`.
pub fn render_index(index: &SiteIndex, options: &IndexOptions, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "---\ntitle: {}\ngenerated_at: {}\n---\n\n# {}\n\n{}\n\n## Table of Contents\n\n",
        yaml_string(&options.title),
        yaml_string(&generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        options.title,
        options.description,
    );

    for category in index.ordered_categories(&options.category_order) {
        let display = options
            .category_titles
            .get(category)
            .cloned()
            .unwrap_or_else(|| category_display(category));
        let _ = write!(out, "### {display}\n\n");

        let mut entries: Vec<&IndexEntry> = index.entries(category).iter().collect();
        entries.sort();
        for entry in entries {
            let _ = writeln!(out, "- [{}]({})", entry.title, entry.path);
        }
        out.push('\n');
    }
    out
}

/// Write `index.md` into `output_dir`.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) when the file cannot be written.
pub fn generate_index(output_dir: &Path, index: &SiteIndex, options: &IndexOptions) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(INDEX_FILE);
    fs::write(&path, render_index(index, options, Utc::now()))?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> SiteIndex {
        let mut index = SiteIndex::default();
        index.add("interfaces/Animation/index", "Animation", "u1");
        index.add("guides/Tips", "Tips", "u2");
        index.add("guides/Keyframe_Formats", "Keyframe Formats", "u3");
        index.add("Web_Animations_API", "Web Animations API", "u4");
        index.add("zeta/page", "Zeta", "u5");
        index.add("alpha/page", "Alpha", "u6");
        index
    }

    #[test]
    fn test_category_ordering() {
        let index = sample();
        let order = vec!["main".to_string(), "guides".to_string(), "missing".to_string()];
        assert_eq!(
            index.ordered_categories(&order),
            vec!["main", "guides", "alpha", "interfaces", "zeta"]
        );
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn test_display_titles() {
        assert_eq!(category_display("guides"), "Guides");
        assert_eq!(category_display("web_APIS"), "Web Apis");
        assert_eq!(category_display("v2beta"), "V2Beta");
    }

    #[test]
    fn test_render_index_layout() {
        let options = IndexOptions {
            title: "MDN Documentation".to_string(),
            description: "Extracted.".to_string(),
            category_order: vec!["main".to_string(), "guides".to_string()],
            category_titles: BTreeMap::from([("main".to_string(), "Overview".to_string())]),
        };
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let text = render_index(&sample(), &options, at);

        assert!(text.starts_with(
            "---\ntitle: \"MDN Documentation\"\ngenerated_at: \"2025-01-02T03:04:05Z\"\n---\n\n# MDN Documentation\n\nExtracted.\n\n## Table of Contents\n\n### Overview\n\n- [Web Animations API](Web_Animations_API.md)\n\n### Guides\n\n- [Keyframe Formats](guides/Keyframe_Formats.md)\n- [Tips](guides/Tips.md)\n\n### Alpha\n"
        ));
        assert!(text.ends_with("### Zeta\n\n- [Zeta](zeta/page.md)\n\n"));
    }

    #[test]
    fn test_generate_index_writes_file() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("output");
        let path = generate_index(&out, &SiteIndex::default(), &IndexOptions::default()).unwrap();
        assert_eq!(path, out.join("index.md"));
        assert!(fs::read_to_string(path).unwrap().contains("## Table of Contents"));
    }
}
