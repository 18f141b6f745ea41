//! Locating the Firecrawl CLI and validating its version.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::MIN_VERSION;
use crate::{Error, Result};

#[allow(clippy::unwrap_used)]
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v?(\d+\.\d+\.\d+)").unwrap());

/// Handle to a Firecrawl CLI installation that meets [`MIN_VERSION`].
#[derive(Debug, Clone)]
pub struct FirecrawlCli {
    path: String,
    version: Version,
}

impl FirecrawlCli {
    /// Find `firecrawl` on `PATH` and validate its version.
    ///
    /// # Errors
    ///
    /// - [`Error::FirecrawlNotInstalled`] when the executable is missing or
    ///   does not report a version.
    /// - [`Error::FirecrawlVersionTooOld`] when it is older than
    ///   [`MIN_VERSION`].
    #[instrument(level = "debug")]
    pub async fn detect() -> Result<Self> {
        let path = find_firecrawl_path()
            .await
            .map_err(|_| Error::FirecrawlNotInstalled)?;
        Self::at(path).await
    }

    /// Validate the executable at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`detect`](Self::detect).
    pub async fn at(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let version = get_firecrawl_version(&path)
            .await
            .map_err(|e| {
                debug!("firecrawl --version failed: {e}");
                Error::FirecrawlNotInstalled
            })?;
        check_minimum(&version)?;
        debug!("Using firecrawl {version} at {path}");
        Ok(Self { path, version })
    }

    /// Path to the executable.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Detected version.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.version
    }
}

fn check_minimum(version: &Version) -> Result<()> {
    let min_version = Version::parse(MIN_VERSION)
        .map_err(|e| Error::Config(format!("Invalid MIN_VERSION constant: {e}")))?;
    if *version < min_version {
        return Err(Error::FirecrawlVersionTooOld {
            found: version.to_string(),
            required: min_version.to_string(),
        });
    }
    Ok(())
}

async fn find_firecrawl_path() -> Result<String> {
    #[cfg(windows)]
    let which_cmd = "where";
    #[cfg(not(windows))]
    let which_cmd = "which";

    let output = Command::new(which_cmd).arg("firecrawl").output().await?;
    if !output.status.success() {
        return Err(Error::NotFound("firecrawl not found in PATH".to_string()));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| Error::NotFound("firecrawl not found in PATH".to_string()))
}

async fn get_firecrawl_version(path: &str) -> Result<Version> {
    let output = Command::new(path).arg("--version").output().await?;
    if !output.status.success() {
        return Err(Error::Other("Failed to get firecrawl version".to_string()));
    }
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Version in `firecrawl --version` output such as `firecrawl 1.2.3`,
/// `Firecrawl CLI v1.1.0` or `1.2.3`.
fn parse_version(output: &str) -> Result<Version> {
    let captures = VERSION_RE.captures(output).ok_or_else(|| {
        Error::Parse(format!("Could not parse version from firecrawl output: {output}"))
    })?;
    let version = captures.get(1).map_or("", |m| m.as_str());
    Version::parse(version).map_err(|e| Error::Parse(format!("Invalid version '{version}': {e}")))
}
