//! Turning fetched pages into the markdown tree.
//!
//! Each successful page goes through [`PageRenderer`] (title cleanup,
//! content cleaning, link rewriting, fingerprinting), is written by
//! [`MarkdownWriter`], recorded in the [`CrawlState`], and listed in the
//! [`SiteIndex`] that [`generate_index`] turns into `index.md`.

mod index;
mod render;
mod writer;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, instrument, warn};

pub use index::{
    IndexEntry, IndexOptions, MAIN_CATEGORY, SiteIndex, category_for, generate_index, render_index,
};
pub use render::{PageRenderer, RenderedContentFetcher, RenderedPage};
pub use writer::MarkdownWriter;

use crate::Result;
use crate::crawl::FetchOutcome;
use crate::events::{CrawlEvent, EventSink};
use crate::state::{CrawlState, PageRecord};

/// What [`generate_markdown_files`] produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Page files written, excluding the index.
    pub files_written: usize,
    /// Entries for the index.
    pub index: SiteIndex,
    /// URLs that were fetched but have no output identifier.
    pub skipped: Vec<String>,
}

/// Render and write every successful page in `pages`.
///
/// When `state` is given, each written page is recorded with its
/// fingerprint and, if `record_validators` is set, the validators seen when
/// it was fetched. The state also keeps the successful URLs of `pages`,
/// which must be the set `renderer` rewrites links against. The caller
/// saves the state.
///
/// # Errors
///
/// Returns the first write failure; pages written before it stay on disk.
#[instrument(level = "debug", skip_all, fields(pages = pages.len()))]
pub fn generate_markdown_files(
    pages: &BTreeMap<String, FetchOutcome>,
    renderer: &PageRenderer,
    writer: &MarkdownWriter,
    mut state: Option<&mut CrawlState>,
    record_validators: bool,
    events: &dyn EventSink,
) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();
    if let Some(state) = state.as_deref_mut() {
        state.set_crawled_urls(
            pages
                .iter()
                .filter(|(_, outcome)| outcome.page().is_some())
                .map(|(url, _)| url.clone()),
        );
    }

    for (url, outcome) in pages {
        let Some(page) = outcome.page() else {
            continue;
        };
        let Some(rendered) = renderer.render(page) else {
            warn!("No output path for {url}");
            report.skipped.push(url.clone());
            events.emit(CrawlEvent::PageSkipped { url: url.clone() });
            continue;
        };

        let path = writer.write(&rendered, Utc::now())?;
        debug!("Wrote {}", path.display());

        if let Some(state) = state.as_deref_mut() {
            let mut record =
                PageRecord::new(&rendered.url, &rendered.fingerprint, &rendered.title);
            if record_validators {
                record =
                    record.with_validators(rendered.etag.clone(), rendered.last_modified.clone());
            }
            state.set_page(rendered.identifier.clone(), record);
        }

        report
            .index
            .add(&rendered.identifier, &rendered.title, &rendered.url);
        report.files_written += 1;
        events.emit(CrawlEvent::PageWritten {
            identifier: rendered.identifier,
        });
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cleaner::BaseCleaner;
    use crate::crawl::CrawledPage;
    use crate::detect::{ChangeStatus, check_local_tree};
    use crate::events::NullSink;
    use crate::links::LinkTransformer;
    use crate::sources::path_identifier;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn success(url: &str, title: &str, markdown: &str) -> (String, FetchOutcome) {
        let page = CrawledPage {
            url: url.to_string(),
            markdown: markdown.to_string(),
            title: Some(title.to_string()),
            description: None,
            internal_links: Vec::new(),
            response_headers: BTreeMap::from([("etag".to_string(), "\"e1\"".to_string())]),
        };
        (url.to_string(), FetchOutcome::Success(page))
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(Arc::new(BaseCleaner), Arc::new(path_identifier))
    }

    #[test]
    fn test_generation_writes_records_and_indexes() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("output");
        let mut state = CrawlState::load(temp.path());
        let pages = BTreeMap::from([
            success("https://s.test/guide/intro", "Intro", "Welcome"),
            success("https://s.test/overview", "Overview", "Top"),
            (
                "https://s.test/broken".to_string(),
                FetchOutcome::Failure {
                    error: "boom".to_string(),
                },
            ),
            success("https://s.test/", "Root", "unmapped"),
        ]);

        let events = Mutex::new(Vec::new());
        let sink = |e: CrawlEvent| events.lock().unwrap().push(e);
        let report = generate_markdown_files(
            &pages,
            &renderer(),
            &MarkdownWriter::new(&output),
            Some(&mut state),
            true,
            &sink,
        )
        .unwrap();

        assert_eq!(report.files_written, 2);
        assert_eq!(report.skipped, vec!["https://s.test/".to_string()]);
        assert_eq!(report.index.len(), 2);
        assert_eq!(report.index.entries("guide")[0].path, "guide/intro.md");
        assert_eq!(report.index.entries(MAIN_CATEGORY)[0].title, "Overview");

        let record = state.get_page("guide/intro").unwrap();
        assert_eq!(record.etag.as_deref(), Some("\"e1\""));
        assert!(state.supports_etag());

        let events = events.lock().unwrap();
        assert!(events.contains(&CrawlEvent::PageWritten {
            identifier: "overview".to_string()
        }));
        assert!(events.contains(&CrawlEvent::PageSkipped {
            url: "https://s.test/".to_string()
        }));

        let results = check_local_tree(&output, state.pages());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == ChangeStatus::Unchanged));
    }

    #[test]
    fn test_stale_record_does_not_change_rerendered_fingerprint() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());
        state.set_page("b", PageRecord::new("https://s.test/b", "sha256:old", "B"));

        // b fails this run, so a's link to it stays absolute.
        let pages = BTreeMap::from([
            success("https://s.test/a", "A", "See [b](https://s.test/b)."),
            (
                "https://s.test/b".to_string(),
                FetchOutcome::Failure {
                    error: "timeout".to_string(),
                },
            ),
        ]);
        let links = |urls: Vec<&str>| {
            renderer().with_links(LinkTransformer::new("https://s.test", urls).unwrap())
        };
        generate_markdown_files(
            &pages,
            &links(vec!["https://s.test/a"]),
            &MarkdownWriter::new(temp.path().join("output")),
            Some(&mut state),
            true,
            &NullSink,
        )
        .unwrap();

        assert!(state.get_page("b").is_some());
        assert_eq!(state.link_targets(), vec!["https://s.test/a"]);

        let (_, outcome) = success("https://s.test/a", "A", "See [b](https://s.test/b).");
        let again = links(state.link_targets()).render(outcome.page().unwrap()).unwrap();
        assert_eq!(again.fingerprint, state.get_page("a").unwrap().content_fingerprint);
        assert!(again.markdown.contains("(https://s.test/b)"));
    }

    #[test]
    fn test_validators_not_recorded_when_disabled() {
        let temp = TempDir::new().unwrap();
        let mut state = CrawlState::load(temp.path());
        let pages = BTreeMap::from([success("https://s.test/a", "A", "x")]);

        generate_markdown_files(
            &pages,
            &renderer(),
            &MarkdownWriter::new(temp.path().join("output")),
            Some(&mut state),
            false,
            &NullSink,
        )
        .unwrap();

        assert!(state.get_page("a").unwrap().etag.is_none());
        assert!(!state.supports_etag());
    }
}
