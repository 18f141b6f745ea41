//! Offline comparison of generated files against saved state.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::{ChangeReason, ChangeResult, ChangeStatus};
use crate::fingerprint::fingerprint;
use crate::state::PageRecord;

/// Name of the generated index, which never has a state record.
pub const INDEX_FILE: &str = "index.md";

const FRONT_MATTER_DELIMITER: &str = "---";

/// Body of a generated file with its leading front matter removed.
///
/// Front matter opens with a first line of exactly `---` and closes at the
/// next line of exactly `---`. The single blank line after it and the final
/// line ending are the writer's layout and are dropped too; the body itself
/// is returned byte for byte. Unterminated front matter leaves the whole
/// text in place.
///
/// ```rust
/// use doccrawl_core::detect::strip_front_matter;
///
/// let file = "---\ntitle: \"A\"\n---\n\n# A\n\nBody\n";
/// assert_eq!(strip_front_matter(file), "# A\n\nBody");
/// ```
pub fn strip_front_matter(text: &str) -> &str {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return text;
    };
    if !is_delimiter(first) {
        return strip_line_ending(text);
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if is_delimiter(line) {
            let body = &text[offset..];
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return strip_line_ending(body);
        }
    }
    strip_line_ending(text)
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == FRONT_MATTER_DELIMITER
}

fn strip_line_ending(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Compare the generated file for `identifier` against its saved record.
///
/// - Missing file: `removed` / `missing_file`.
/// - Unreadable file: `removed` / `read_error:<detail>`.
/// - Body fingerprint differs: `changed` / `local_modified`.
/// - Otherwise `unchanged` / `content_hash`.
pub fn check_local_file(output_dir: &Path, identifier: &str, record: &PageRecord) -> ChangeResult {
    let path = output_dir.join(format!("{identifier}.md"));
    let url = record.source_url.as_str();

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return ChangeResult::new(
                url,
                identifier,
                ChangeStatus::Removed,
                ChangeReason::MissingFile,
            );
        },
        Err(e) => {
            debug!("Failed to read {}: {e}", path.display());
            return ChangeResult::new(
                url,
                identifier,
                ChangeStatus::Removed,
                ChangeReason::ReadError(e.to_string()),
            );
        },
    };

    if fingerprint(strip_front_matter(&content)) == record.content_fingerprint {
        ChangeResult::new(url, identifier, ChangeStatus::Unchanged, ChangeReason::ContentHash)
    } else {
        ChangeResult::new(url, identifier, ChangeStatus::Changed, ChangeReason::LocalModified)
    }
}

/// Generated `.md` files under `output_dir` that have no saved record,
/// reported as `new` / `new_local_file`. The index file is skipped.
pub fn find_untracked_files(
    output_dir: &Path,
    pages: &BTreeMap<String, PageRecord>,
) -> Vec<ChangeResult> {
    let mut identifiers = Vec::new();
    collect_markdown_identifiers(output_dir, output_dir, &mut identifiers);
    identifiers.sort();

    identifiers
        .into_iter()
        .filter(|identifier| !pages.contains_key(identifier))
        .map(|identifier| {
            ChangeResult::new("", identifier, ChangeStatus::New, ChangeReason::NewLocalFile)
        })
        .collect()
}

/// Check every saved page on disk, then append untracked files.
pub fn check_local_tree(
    output_dir: &Path,
    pages: &BTreeMap<String, PageRecord>,
) -> Vec<ChangeResult> {
    let mut results: Vec<ChangeResult> = pages
        .iter()
        .map(|(identifier, record)| check_local_file(output_dir, identifier, record))
        .collect();
    results.extend(find_untracked_files(output_dir, pages));
    results
}

fn collect_markdown_identifiers(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Skipping unreadable directory {}: {e}", dir.display());
            }
            return;
        },
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_identifiers(root, &path, out);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if relative == Path::new(INDEX_FILE) {
            continue;
        }
        let identifier = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push(identifier);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fingerprint::page_document;
    use tempfile::TempDir;

    fn write(root: &Path, identifier: &str, contents: &str) {
        let path = root.join(format!("{identifier}.md"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn generated(timestamp: &str, body: &str) -> String {
        format!(
            "---\ntitle: \"Animation\"\ncrawled_at: \"{timestamp}\"\n---\n\n{}\n",
            page_document("Animation", body)
        )
    }

    fn record_for(body: &str) -> PageRecord {
        PageRecord::new(
            "https://site/docs/Animation",
            fingerprint(&page_document("Animation", body)),
            "Animation",
        )
    }

    #[test]
    fn test_strip_front_matter_variants() {
        assert_eq!(strip_front_matter("# Plain\n\nBody\n"), "# Plain\n\nBody");
        assert_eq!(strip_front_matter("---\na: 1\n---\nBody"), "Body");
        assert_eq!(strip_front_matter("---\r\na: 1\r\n---\r\n\r\nBody\r\n"), "Body");
        assert_eq!(strip_front_matter(""), "");
    }

    #[test]
    fn test_strip_requires_exact_delimiter_lines() {
        // A thematic break inside the front matter value does not close it.
        let text = "---\nnote: \"a --- b\"\n---\nBody";
        assert_eq!(strip_front_matter(text), "Body");

        // First line must be exactly three dashes.
        let text = "----\nBody\n---\nTail";
        assert_eq!(strip_front_matter(text), text);
    }

    #[test]
    fn test_strip_keeps_body_whitespace() {
        assert_eq!(strip_front_matter("---\na: 1\n---\n\n# T\n\n\n"), "# T\n\n");
        assert_eq!(strip_front_matter("# T\n\n\n"), "# T\n\n");
        assert_eq!(strip_front_matter("---\na: 1\n---\n\n\nBody\n"), "\nBody");
    }

    #[test]
    fn test_empty_body_page_is_unchanged() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "interfaces/Stub/index", &generated("t", ""));

        let result = check_local_file(temp.path(), "interfaces/Stub/index", &record_for(""));

        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(result.reason, ChangeReason::ContentHash);
    }

    #[test]
    fn test_trailing_whitespace_edit_is_local_modified() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "guides/intro", &generated("t", "Body text\n\n"));

        let result = check_local_file(temp.path(), "guides/intro", &record_for("Body text"));

        assert_eq!(result.status, ChangeStatus::Changed);
    }

    #[test]
    fn test_unterminated_front_matter_keeps_text() {
        let text = "---\ntitle: x\nBody";
        assert_eq!(strip_front_matter(text), text);
    }

    #[test]
    fn test_front_matter_timestamp_change_is_unchanged() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "interfaces/Animation/index",
            &generated("2025-06-01T00:00:00Z", "Body text"),
        );

        let result = check_local_file(
            temp.path(),
            "interfaces/Animation/index",
            &record_for("Body text"),
        );

        assert_eq!(result.status, ChangeStatus::Unchanged);
        assert_eq!(result.reason, ChangeReason::ContentHash);
    }

    #[test]
    fn test_edited_body_is_local_modified() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "guides/intro", &generated("t", "Edited text"));

        let result = check_local_file(temp.path(), "guides/intro", &record_for("Body text"));

        assert_eq!(result.status, ChangeStatus::Changed);
        assert_eq!(result.reason, ChangeReason::LocalModified);
    }

    #[test]
    fn test_missing_file_is_removed() {
        let temp = TempDir::new().unwrap();

        let result = check_local_file(temp.path(), "guides/gone", &record_for("x"));

        assert_eq!(result.status, ChangeStatus::Removed);
        assert_eq!(result.reason, ChangeReason::MissingFile);
        assert_eq!(result.source_url, "https://site/docs/Animation");
    }

    #[test]
    fn test_unreadable_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text.
        fs::create_dir_all(temp.path().join("guides/intro.md")).unwrap();

        let result = check_local_file(temp.path(), "guides/intro", &record_for("x"));

        assert_eq!(result.status, ChangeStatus::Removed);
        assert!(matches!(result.reason, ChangeReason::ReadError(_)));
        assert!(result.reason.to_string().starts_with("read_error:"));
    }

    #[test]
    fn test_untracked_files_skip_only_root_index() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "index", "# Index");
        write(temp.path(), "guides/intro", "tracked");
        write(temp.path(), "guides/extra", "untracked");
        write(temp.path(), "interfaces/KeyframeEffect/index", "untracked");
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let mut pages = BTreeMap::new();
        pages.insert("guides/intro".to_string(), record_for("x"));

        let untracked = find_untracked_files(temp.path(), &pages);
        let ids: Vec<&str> = untracked.iter().map(|r| r.identifier.as_str()).collect();

        assert_eq!(ids, vec!["guides/extra", "interfaces/KeyframeEffect/index"]);
        assert!(untracked.iter().all(|r| r.reason == ChangeReason::NewLocalFile));
        assert!(untracked.iter().all(|r| r.source_url.is_empty()));
    }

    #[test]
    fn test_check_local_tree_missing_output_dir() {
        let temp = TempDir::new().unwrap();
        let mut pages = BTreeMap::new();
        pages.insert("a".to_string(), record_for("x"));

        let results = check_local_tree(&temp.path().join("output"), &pages);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reason, ChangeReason::MissingFile);
    }
}
