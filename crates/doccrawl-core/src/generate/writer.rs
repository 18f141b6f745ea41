use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::render::RenderedPage;
use crate::links::MARKDOWN_SUFFIX;
use crate::{Error, Result};

/// Writes rendered pages below an output directory.
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    output_dir: PathBuf,
    frontmatter: bool,
}

impl MarkdownWriter {
    /// Writer for `output_dir`, with front matter enabled.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            frontmatter: true,
        }
    }

    /// Enable or disable front matter.
    #[must_use]
    pub const fn with_frontmatter(mut self, frontmatter: bool) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    /// Output root.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File path for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when the identifier is empty, absolute, or
    /// climbs out of the output directory.
    pub fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        let relative = Path::new(identifier);
        let safe = !identifier.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::Storage(format!(
                "Refusing to write identifier '{identifier}' outside the output directory"
            )));
        }
        Ok(self
            .output_dir
            .join(format!("{identifier}{MARKDOWN_SUFFIX}")))
    }

    /// File contents for `page`.
    pub fn render_file(&self, page: &RenderedPage, crawled_at: DateTime<Utc>) -> String {
        let document = page.document();
        if !self.frontmatter {
            return format!("{document}\n");
        }
        format!(
            "---\ntitle: {}\nurl: {}\ncrawled_at: {}\ncontent_hash: {}\n---\n\n{document}\n",
            yaml_string(&page.title),
            yaml_string(&page.url),
            yaml_string(&crawled_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            yaml_string(&page.fingerprint),
        )
    }

    /// Write `page`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] for an unsafe identifier and
    /// [`Error::Io`] when the file cannot be written.
    pub fn write(&self, page: &RenderedPage, crawled_at: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.path_for(&page.identifier)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.render_file(page, crawled_at))?;
        Ok(path)
    }
}

/// Double-quoted YAML scalar. JSON string syntax is a subset of it.
pub(crate) fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "'")))
}
