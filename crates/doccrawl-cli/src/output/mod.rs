//! # Output Formatting
//!
//! Commands print either human-readable text (colored when stdout allows)
//! or a single JSON document for scripting:
//!
//! ```bash
//! doccrawl check mdn-web-animations-api -f json | jq '.changed[].identifier'
//! ```

pub mod report;

/// Output format for commands that print a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty text output (default)
    Text,
    /// Single JSON document
    Json,
}
