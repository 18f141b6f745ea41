//! Locating sources on disk.
//!
//! ```text
//! <root>/sources/<name>/config.toml
//! <root>/sources/<name>/.crawl-state.json
//! <root>/sources/<name>/output/
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use doccrawl_core::sources::SourceRegistry;
use doccrawl_core::{CrawlState, ResolvedSource, SourceConfig, SourceOverrides};

/// Directory holding the source directories.
pub const SOURCES_DIR: &str = "sources";
/// Generated tree inside a source directory.
pub const OUTPUT_DIR: &str = "output";

/// The directory `doccrawl` operates on.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

/// One source: its config resolved for this run, plus its locations.
pub struct Source {
    /// Merged settings.
    pub resolved: ResolvedSource,
    /// `sources/<name>`.
    pub dir: PathBuf,
}

impl Source {
    /// Generated tree.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(OUTPUT_DIR)
    }

    /// Saved page state.
    pub fn load_state(&self) -> CrawlState {
        CrawlState::load(&self.dir)
    }
}

impl Workspace {
    /// `root`, or the current directory when none was given.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        Ok(Self { root })
    }

    /// `sources/` under the root.
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join(SOURCES_DIR)
    }

    /// Directory of source `name`.
    pub fn source_dir(&self, name: &str) -> PathBuf {
        self.sources_dir().join(name)
    }

    /// Names of source directories that contain a config file, sorted.
    pub fn source_names(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.sources_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().join(SourceConfig::FILE_NAME).is_file())
            .filter_map(|entry| entry.file_name().to_str().map(ToString::to_string))
            .collect();
        names.sort();
        names
    }

    /// Parsed config of source `name`.
    pub fn load_config(&self, name: &str) -> Result<SourceConfig> {
        let path = self.source_dir(name).join(SourceConfig::FILE_NAME);
        if !path.is_file() {
            let available = self.source_names();
            if available.is_empty() {
                bail!(
                    "Source '{name}' not found: no sources in {}",
                    self.sources_dir().display()
                );
            }
            bail!(
                "Source '{name}' not found. Available sources: {}",
                available.join(", ")
            );
        }
        SourceConfig::load(&path).with_context(|| format!("Failed to load config for '{name}'"))
    }

    /// Source `name` resolved against the built-in profiles and `overrides`.
    pub fn load_source(&self, name: &str, overrides: &SourceOverrides) -> Result<Source> {
        let config = self.load_config(name)?;
        let resolved = config
            .resolve(name, &SourceRegistry::builtin(), overrides)
            .with_context(|| format!("Failed to resolve config for '{name}'"))?;
        Ok(Source {
            resolved,
            dir: self.source_dir(name),
        })
    }
}
