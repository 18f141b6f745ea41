//! Change reports for `check` and `check-remote`.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use doccrawl_core::detect::{ChangeResult, ChangeSummary};
use serde::Serialize;

use super::OutputFormat;

/// Which comparison produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Generated files against the saved state.
    Local,
    /// The live site against the saved state.
    Remote,
}

impl CheckMode {
    const fn subject(self) -> &'static str {
        match self {
            Self::Local => "local files",
            Self::Remote => "remote changes",
        }
    }

    const fn changed_label(self) -> &'static str {
        match self {
            Self::Local => "modified locally",
            Self::Remote => "changed",
        }
    }

    const fn changed_heading(self) -> &'static str {
        match self {
            Self::Local => "Modified pages:",
            Self::Remote => "Changed pages:",
        }
    }
}

/// Opening lines printed before a check runs.
pub fn header(source: &str, last_crawl: Option<DateTime<Utc>>, mode: CheckMode) -> String {
    let mut out = format!("Checking {} for {source}...\n", mode.subject());
    if let Some(at) = last_crawl {
        let _ = writeln!(out, "Last crawl: {}", at.to_rfc3339());
    }
    out
}

/// Counts and listed identifiers for a finished check.
pub fn render_text(summary: &ChangeSummary, source: &str, mode: CheckMode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nTotal files: {}", summary.total());
    let _ = writeln!(out, "  - {} unchanged", summary.unchanged.len());
    let _ = writeln!(out, "  - {} {}", summary.changed.len(), mode.changed_label());
    let _ = writeln!(out, "  - {} new", summary.new.len());
    let _ = writeln!(out, "  - {} removed", summary.removed.len());

    if !summary.changed.is_empty() {
        let _ = writeln!(out, "\n{}", mode.changed_heading().yellow().bold());
        for result in &summary.changed {
            let _ = writeln!(out, "  - {}.md ({})", result.identifier, result.reason);
        }
    }
    list_section(&mut out, "New pages:".green().bold().to_string(), &summary.new);
    list_section(&mut out, "Removed pages:".red().bold().to_string(), &summary.removed);

    if mode == CheckMode::Remote && summary.has_drift() {
        let _ = writeln!(out, "\nRun 'doccrawl crawl {source}' to update.");
    }
    out
}

fn list_section(out: &mut String, heading: String, results: &[ChangeResult]) {
    if results.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for result in results {
        let _ = writeln!(out, "  - {}.md", result.identifier);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    source: &'a str,
    mode: CheckMode,
    last_crawl: Option<DateTime<Utc>>,
    total: usize,
    has_drift: bool,
    #[serde(flatten)]
    summary: &'a ChangeSummary,
}

/// The summary as one JSON document.
pub fn render_json(
    summary: &ChangeSummary,
    source: &str,
    last_crawl: Option<DateTime<Utc>>,
    mode: CheckMode,
) -> Result<String> {
    let report = JsonReport {
        source,
        mode,
        last_crawl,
        total: summary.total(),
        has_drift: summary.has_drift(),
        summary,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Printed instead of a report when the source was never crawled. JSON
/// output gets an empty report so consumers always receive a document.
pub fn print_no_state(source: &str, mode: CheckMode, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("No saved state for {source}. Run a crawl first."),
        OutputFormat::Json => println!(
            "{}",
            render_json(&ChangeSummary::default(), source, None, mode)?
        ),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use doccrawl_core::detect::{ChangeReason, ChangeStatus};

    fn summary() -> ChangeSummary {
        ChangeSummary::from_results([
            ChangeResult::new("u1", "a", ChangeStatus::Unchanged, ChangeReason::Etag),
            ChangeResult::new("u2", "guides/b", ChangeStatus::Changed, ChangeReason::ContentHash),
            ChangeResult::new("", "c", ChangeStatus::New, ChangeReason::NewLocalFile),
            ChangeResult::new("u4", "d", ChangeStatus::Removed, ChangeReason::NotFound),
        ])
    }

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_local_report_wording() {
        plain();
        let text = render_text(&summary(), "mdn", CheckMode::Local);
        assert!(text.contains("Total files: 4\n"));
        assert!(text.contains("  - 1 modified locally\n"));
        assert!(text.contains("Modified pages:\n  - guides/b.md (content_hash)\n"));
        assert!(text.contains("New pages:\n  - c.md\n"));
        assert!(text.contains("Removed pages:\n  - d.md\n"));
        assert!(!text.contains("doccrawl crawl"));
    }

    #[test]
    fn test_remote_report_hint_only_on_drift() {
        plain();
        let text = render_text(&summary(), "mdn", CheckMode::Remote);
        assert!(text.contains("  - 1 changed\n"));
        assert!(text.contains("Changed pages:"));
        assert!(text.ends_with("Run 'doccrawl crawl mdn' to update.\n"));

        let clean = ChangeSummary::from_results([ChangeResult::new(
            "u1",
            "a",
            ChangeStatus::Unchanged,
            ChangeReason::Etag,
        )]);
        let text = render_text(&clean, "mdn", CheckMode::Remote);
        assert!(!text.contains("Run '"));
        assert!(!text.contains("pages:"));
    }

    #[test]
    fn test_header() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            header("mdn", Some(at), CheckMode::Remote),
            "Checking remote changes for mdn...\nLast crawl: 2025-01-02T03:04:05+00:00\n"
        );
        assert_eq!(
            header("mdn", None, CheckMode::Local),
            "Checking local files for mdn...\n"
        );
    }

    #[test]
    fn test_json_report_shape() {
        let json = render_json(&summary(), "mdn", None, CheckMode::Remote).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "mdn");
        assert_eq!(value["mode"], "remote");
        assert_eq!(value["total"], 4);
        assert_eq!(value["hasDrift"], true);
        assert_eq!(value["changed"][0]["identifier"], "guides/b");
        assert_eq!(value["changed"][0]["reason"], "content_hash");
        assert_eq!(value["new"][0]["sourceUrl"], "");
        assert!(value["lastCrawl"].is_null());
    }
}
