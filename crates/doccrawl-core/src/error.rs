//! Error types and handling for doccrawl-core operations.
//!
//! Only genuine faults are errors here. Expected crawl outcomes such as a
//! missing page, an unreachable host during a validator probe, or an
//! unreadable generated file are reported as [`ChangeResult`] values and
//! never surface through this type.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: File system operations while writing output or state
//! - **Network Errors**: HTTP requests made outside the validator probe
//! - **Parse Errors**: Malformed scraper output, bad regular expressions
//! - **Storage Errors**: Persisting the per-source state document
//! - **Configuration Errors**: Invalid `config.toml` or unknown profiles
//! - **Firecrawl Errors**: The external page-rendering engine
//!
//! ```rust
//! use doccrawl_core::Error;
//!
//! let err = Error::FirecrawlCommandFailed("exit status 1".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "firecrawl");
//! ```
//!
//! [`ChangeResult`]: crate::detect::ChangeResult

use thiserror::Error;

/// The main error type for doccrawl-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Connection and timeout failures are recoverable; malformed requests
    /// are not.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    ///
    /// Raised for scraper output that is not the expected JSON shape and for
    /// patterns that do not compile.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Storage operation failed.
    ///
    /// Raised when the state document cannot be written. Loading never
    /// produces this error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Firecrawl CLI is not installed or not in PATH.
    #[error("Firecrawl CLI not installed. Install with: npm install -g firecrawl")]
    FirecrawlNotInstalled,

    /// Firecrawl CLI version is too old.
    #[error("Firecrawl CLI version {found} is too old (minimum required: {required})")]
    FirecrawlVersionTooOld {
        /// Version that was found.
        found: String,
        /// Minimum required version.
        required: String,
    },

    /// Firecrawl scrape operation failed for one page.
    #[error("Firecrawl scrape failed for '{url}': {reason}")]
    FirecrawlScrapeFailed {
        /// URL that failed to scrape.
        url: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Firecrawl command execution failed.
    #[error("Firecrawl command failed: {0}")]
    FirecrawlCommandFailed(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl Error {
    /// Whether the failure is transient, so a later attempt may succeed.
    ///
    /// Scrape failures log transient errors at debug level and the rest as
    /// warnings.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::FirecrawlScrapeFailed { .. } | Self::FirecrawlCommandFailed(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used as a structured field when logging failures.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Serialization(_) => "serialization",
            Self::FirecrawlNotInstalled
            | Self::FirecrawlVersionTooOld { .. }
            | Self::FirecrawlScrapeFailed { .. }
            | Self::FirecrawlCommandFailed(_) => "firecrawl",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
