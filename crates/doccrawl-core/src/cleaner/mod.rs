//! Markdown cleanup applied to scraped pages before link rewriting.
//!
//! A cleaner is any [`ContentCleaner`]: a struct, or a plain closure
//! `Fn(&str, &str) -> String`. Source profiles compose site-specific rules
//! on top of [`BaseCleaner`] rather than extending it.

mod mdn;

use std::sync::LazyLock;

use regex::Regex;

pub use mdn::MdnCleaner;

/// Transforms scraped markdown for one page.
pub trait ContentCleaner: Send + Sync {
    /// Clean `markdown` for the page titled `title`.
    fn clean(&self, markdown: &str, title: &str) -> String;
}

impl<F> ContentCleaner for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn clean(&self, markdown: &str, title: &str) -> String {
        self(markdown, title)
    }
}

#[allow(clippy::unwrap_used)]
static HEADING_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+\[([^\]]+)\]\([^)]+\)\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static EXCESS_NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleanup shared by every source: unwraps linked headings and collapses
/// runs of blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCleaner;

impl ContentCleaner for BaseCleaner {
    fn clean(&self, markdown: &str, _title: &str) -> String {
        collapse_blank_lines(&unwrap_heading_anchors(markdown))
    }
}

/// `## [Title](url)` becomes `## Title`.
pub fn unwrap_heading_anchors(markdown: &str) -> String {
    markdown
        .split('\n')
        .map(|line| {
            HEADING_ANCHOR_RE.captures(line).map_or_else(
                || line.to_string(),
                |cap| format!("{} {}", &cap[1], &cap[2]),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce three or more newlines to two and trim the result.
pub fn collapse_blank_lines(markdown: &str) -> String {
    EXCESS_NEWLINES_RE
        .replace_all(markdown, "\n\n")
        .trim()
        .to_string()
}

/// Remove every section whose heading at `level` starts with `heading`.
///
/// A section runs until the next heading of exactly the same level. Deeper
/// headings belong to the section.
pub fn remove_section(markdown: &str, heading: &str, level: usize) -> String {
    let hashes = "#".repeat(level);
    let opens_section = |line: &str| -> bool {
        line.strip_prefix(hashes.as_str())
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .is_some_and(|rest| rest.trim_start().starts_with(heading))
    };
    let same_level = |line: &str| -> bool {
        line.strip_prefix(hashes.as_str())
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    };

    let mut kept = Vec::new();
    let mut skipping = false;
    for line in markdown.split('\n') {
        if opens_section(line) {
            skipping = true;
            continue;
        }
        if skipping && same_level(line) {
            skipping = false;
        }
        if !skipping {
            kept.push(line);
        }
    }
    kept.join("\n")
}

/// Remove the first `# ` heading line.
pub fn remove_first_h1(markdown: &str) -> String {
    let mut removed = false;
    markdown
        .split('\n')
        .filter(|line| {
            if !removed && line.starts_with("# ") {
                removed = true;
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove every line containing `needle`.
pub fn remove_lines_containing(markdown: &str, needle: &str) -> String {
    markdown
        .split('\n')
        .filter(|line| !line.contains(needle))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the line containing `start_marker` and the block following it.
///
/// The block ends at a line matching `end`, at a heading, or at the first
/// non-blank line that is not indented.
pub fn remove_block_until_heading(markdown: &str, start_marker: &str, end: Option<&Regex>) -> String {
    let mut kept = Vec::new();
    let mut in_block = false;
    for line in markdown.split('\n') {
        if line.contains(start_marker) {
            in_block = true;
            continue;
        }
        if in_block {
            let ends = end.is_some_and(|re| re.is_match(line))
                || line.starts_with('#')
                || (!line.trim().is_empty() && !line.starts_with(' '));
            if !ends {
                continue;
            }
            in_block = false;
        }
        kept.push(line);
    }
    kept.join("\n")
}
