//! Cleanup rules for MDN Web Docs pages.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{BaseCleaner, ContentCleaner, collapse_blank_lines, remove_first_h1, remove_section};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        #[allow(clippy::unwrap_used)]
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(
    BASELINE_RE,
    r"(?m)^Baseline\s+Widely available\s*\*?\s*\n(?:This feature is well established.*?\n)?(?:\*\s+Some parts of this feature.*?\n)?(?:\s*\*\s*\[.*?\]\(.*?\)\n)*"
);
pattern!(
    LIMITED_RE,
    r"(?m)^Limited availability\s*\n(?:This feature is not Baseline.*?\n)?(?:\s*\*\s*\[.*?\]\(.*?\)\n)*"
);
pattern!(HELP_IMPROVE_RE, r"(?ms)^## Help improve MDN\s*\n.*");
pattern!(BADGE_RE, r"\*\*(?:Experimental|Deprecated|Non-standard)\*\*:?\s*");
pattern!(CODE_EXAMPLE_HEADING_RE, r"^#### (?:HTML|CSS|JavaScript|Result)\s*$");
pattern!(SHALLOW_HEADING_RE, r"^#{1,4} ");
pattern!(
    CODE_INTRO_RE,
    r"^(?:The HTML for the example is shown below\.|The CSS for the example (?:is|looks like)[^.\n]*\.|The JavaScript for the example[^.\n]*\.)\s*$"
);
pattern!(PADDED_CODE_RE, r"` ?([^\s`]+) ?`");
pattern!(WORD_BEFORE_CODE_RE, r#"([a-zA-Z])(`[a-zA-Z0-9_.:\-<>"']+`)"#);
pattern!(CODE_BEFORE_WORD_RE, r#"(`[a-zA-Z0-9_.:\-<>"']+`)([a-zA-Z])"#);
pattern!(META_BOILERPLATE_RE, r"(?m)^_In addition to the properties listed below[^_\n]*_\s*\n?");
pattern!(
    MDN_CSS_LINK_RE,
    r"\[`?([^`\]\[]+)`?\]\(https://developer\.mozilla\.org/[^)]*?/docs/Web/CSS/[^)]+\)"
);
pattern!(
    MDN_HTML_LINK_RE,
    r"\[`?([^`\]\[]+)`?\]\(https://developer\.mozilla\.org/[^)]*?/docs/Web/HTML/[^)]+\)"
);
pattern!(DEFINITION_GAP_RE, r"(\n    [^\n]+)\n{2,}(\[`?[^\]]+`?\]\([^)]+\))");
pattern!(PADDED_CODE_LINK_RE, r"\[\s*`\s*([^`\]]+)`\s*\]");
pattern!(PADDED_LINK_TEXT_RE, r"\[\s+([^\]\[]+?)\s+\]");
pattern!(WORD_BEFORE_LINK_RE, r"([a-zA-Z])\[");
pattern!(ESCAPED_CALL_PARENS_RE, r"\\?\(\\?\)");
pattern!(OPENS_NEW_TAB_RE, r"\\?\(Opens in a new tab\\?\)");
pattern!(ESCAPED_TITLE_RE, r#""([^"]*\\[()][^"]*)""#);
pattern!(READ_ONLY_GLUED_RE, r"(\S)(Read only)");
pattern!(READ_ONLY_TRAILING_RE, r"(Read only)[ \t]+\n");
pattern!(INHERITANCE_CHAIN_RE, r"(?m)^[ \t]*(?:\[\s*\w+\s*\]\([^)]+\)[ \t]*)+$\n?");

/// Cleaner for MDN Web Docs reference and guide pages.
///
/// Runs [`BaseCleaner`] first, then strips MDN page chrome (title heading,
/// availability banners, contribution footer, specification and
/// compatibility sections, badges) and repairs spacing that the
/// HTML-to-markdown conversion loses around inline code and links.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdnCleaner {
    base: BaseCleaner,
}

impl ContentCleaner for MdnCleaner {
    fn clean(&self, markdown: &str, title: &str) -> String {
        let mut content = self.base.clean(markdown, title);

        content = remove_first_h1(&content);
        content = remove_availability_banners(&content);
        content = HELP_IMPROVE_RE.replace(&content, "").trim_end().to_string();
        for section in ["Specifications", "Browser compatibility", "See also"] {
            content = remove_section(&content, section, 2);
        }
        content = BADGE_RE.replace_all(&content, "").into_owned();

        content = remove_orphaned_code_examples(&content);

        content = fix_inline_code_padding(&content);
        content = WORD_BEFORE_CODE_RE.replace_all(&content, "$1 $2").into_owned();
        content = CODE_BEFORE_WORD_RE.replace_all(&content, "$1 $2").into_owned();
        content = META_BOILERPLATE_RE.replace_all(&content, "").into_owned();
        content = MDN_CSS_LINK_RE.replace_all(&content, "`$1`").into_owned();
        content = MDN_HTML_LINK_RE.replace_all(&content, "`$1`").into_owned();

        content = DEFINITION_GAP_RE.replace_all(&content, "$1\n\n$2").into_owned();
        content = PADDED_CODE_LINK_RE.replace_all(&content, "[`$1`]").into_owned();
        content = PADDED_LINK_TEXT_RE.replace_all(&content, "[$1]").into_owned();

        content = WORD_BEFORE_LINK_RE.replace_all(&content, "$1 [").into_owned();
        content = ESCAPED_CALL_PARENS_RE.replace_all(&content, "()").into_owned();
        content = unescape_title_parens(&content);
        content = READ_ONLY_GLUED_RE.replace_all(&content, "$1 $2").into_owned();
        content = READ_ONLY_TRAILING_RE.replace_all(&content, "$1\n").into_owned();
        content = content.replace(",[", ", [").replace(",`", ", `");

        content = INHERITANCE_CHAIN_RE.replace_all(&content, "").into_owned();

        collapse_blank_lines(&content)
    }
}

fn remove_availability_banners(content: &str) -> String {
    let content = BASELINE_RE.replace_all(content, "");
    LIMITED_RE.replace_all(&content, "").into_owned()
}

/// Drop code-example headings whose code block was not extracted, and the
/// intro sentences that announced such a block.
///
/// A `#### HTML|CSS|JavaScript|Result` heading is orphaned when the next
/// non-blank line is a level 1-4 heading or the end of the page. `Result`
/// is also orphaned when followed by prose, since the live demo cannot be
/// rendered.
fn remove_orphaned_code_examples(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let next_non_blank = |from: usize| lines[from + 1..].iter().find(|l| !l.trim().is_empty());

    let mut kept = Vec::with_capacity(lines.len());
    let mut skip_blank = false;
    for (i, line) in lines.iter().enumerate() {
        if skip_blank && line.trim().is_empty() {
            continue;
        }
        skip_blank = false;

        let next = next_non_blank(i);
        let next_is_heading_or_end = next.is_none_or(|l| SHALLOW_HEADING_RE.is_match(l));

        let orphaned_heading = CODE_EXAMPLE_HEADING_RE.is_match(line)
            && (next_is_heading_or_end
                || (line.trim_end() == "#### Result"
                    && next.is_some_and(|l| !l.starts_with("```"))));
        let orphaned_intro = CODE_INTRO_RE.is_match(line) && next_is_heading_or_end;

        if orphaned_heading || orphaned_intro {
            skip_blank = true;
            continue;
        }
        kept.push(*line);
    }
    kept.join("\n")
}

/// `` ` value ` `` becomes `` `value` `` for single-token code spans that
/// are not part of a longer backtick run.
fn fix_inline_code_padding(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for cap in PADDED_CODE_RE.captures_iter(content) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        let padded = whole.len() > cap[1].len() + 2;
        let before = content[..whole.start()].ends_with('`');
        let after = content[whole.end()..].starts_with('`');
        if padded && !before && !after {
            out.push_str(&content[last..whole.start()]);
            out.push('`');
            out.push_str(&cap[1]);
            out.push('`');
            last = whole.end();
        }
    }
    out.push_str(&content[last..]);
    out
}

fn unescape_title_parens(content: &str) -> String {
    let content = OPENS_NEW_TAB_RE.replace_all(content, "(Opens in a new tab)");
    ESCAPED_TITLE_RE
        .replace_all(&content, |cap: &Captures<'_>| {
            format!("\"{}\"", cap[1].replace(r"\(", "(").replace(r"\)", ")"))
        })
        .into_owned()
}
