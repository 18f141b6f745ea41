//! Local check: generated files against the saved state.

use anyhow::Result;
use doccrawl_core::detect::check_local_tree;
use doccrawl_core::{ChangeSummary, SourceOverrides};

use crate::output::OutputFormat;
use crate::output::report::{self, CheckMode};
use crate::workspace::Workspace;

/// Execute the check command
pub fn execute(workspace: &Workspace, source_name: &str, format: OutputFormat) -> Result<()> {
    let source = workspace.load_source(source_name, &SourceOverrides::default())?;
    let state = source.load_state();

    if state.page_count() == 0 {
        return report::print_no_state(source_name, CheckMode::Local, format);
    }

    let summary =
        ChangeSummary::from_results(check_local_tree(&source.output_dir(), state.pages()));

    match format {
        OutputFormat::Text => {
            print!("{}", report::header(source_name, state.last_crawl(), CheckMode::Local));
            print!("{}", report::render_text(&summary, source_name, CheckMode::Local));
        },
        OutputFormat::Json => println!(
            "{}",
            report::render_json(&summary, source_name, state.last_crawl(), CheckMode::Local)?
        ),
    }
    Ok(())
}
