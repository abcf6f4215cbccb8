//! Auto-generated table of contents, fenced by two pairs of markers so the
//! block is recognizable both as an HTML comment and as an Obsidian comment.
//!
//! ```text
//! <!-- MDNAV:TOC START -->
//! %% MDNAV:TOC START %%
//! > [!note]- 🔗 Quick Jump
//! > - [[#Section 1|Section 1]]
//! >   - [[#Subsection 1.1|Subsection 1.1]]
//! <!-- MDNAV:TOC END -->
//! %% MDNAV:TOC END %%
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::{DEFAULT_MAX_DEPTH, MAX_HEADING_LEVEL};
use crate::lines::{has_sections, insert_lines, is_heading_line, parse_headings};

pub const MARK_START_HTML: &str = "<!-- MDNAV:TOC START -->";
pub const MARK_END_HTML: &str = "<!-- MDNAV:TOC END -->";
pub const MARK_START_COMMENT: &str = "%% MDNAV:TOC START %%";
pub const MARK_END_COMMENT: &str = "%% MDNAV:TOC END %%";
pub const QUICK_JUMP: &str = "> [!note]- 🔗 Quick Jump";
pub const NO_HEADINGS: &str = "> - _No headings found_";

static START_HTML_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*MDNAV:TOC START\s*-->").expect("valid toc start regex"));
static START_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\s*MDNAV:TOC START\s*%").expect("valid toc start regex"));
static END_HTML_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*MDNAV:TOC END\s*-->").expect("valid toc end regex"));
static END_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\s*MDNAV:TOC END\s*%").expect("valid toc end regex"));
static END_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:<!--\s*MDNAV:TOC END\s*-->|%%\s*MDNAV:TOC END\s*%%)\s*$")
        .expect("valid toc end line regex")
});

/// Inclusive line span of one detected TOC block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TocBlock {
    pub start: usize,
    pub end: usize,
}

impl TocBlock {
    /// How many of this span's lines sit above `index`.
    fn lines_before(&self, index: usize) -> usize {
        if self.start >= index {
            0
        } else {
            self.end.min(index - 1) - self.start + 1
        }
    }
}

pub fn is_start_marker(line: &str) -> bool {
    START_HTML_RE.is_match(line) || START_COMMENT_RE.is_match(line)
}

pub fn is_end_marker(line: &str) -> bool {
    END_HTML_RE.is_match(line) || END_COMMENT_RE.is_match(line)
}

/// A line holding nothing but one end marker. Prose that merely mentions a
/// marker does not qualify.
fn is_bare_end_marker(line: &str) -> bool {
    END_LINE_RE.is_match(line)
}

/// `0` selects the default depth; anything deeper than H6 is clamped.
pub fn effective_depth(max_depth: u8) -> u8 {
    if max_depth == 0 {
        DEFAULT_MAX_DEPTH
    } else {
        max_depth.min(MAX_HEADING_LEVEL)
    }
}

/// Detects TOC blocks, tolerating duplicated and interleaved markers.
///
/// A block runs from a start marker to the last end marker seen before the
/// next start marker that follows at least one end. Headings also close the
/// scan, so a stray end marker further down never pulls document sections
/// into a block. A start marker with no end after it becomes a one-line block
/// so that it gets cleaned up; the scan then resumes right after it, so every
/// stray start is reported.
pub fn find_toc_blocks(lines: &[String]) -> Vec<TocBlock> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_start_marker(&lines[i]) {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = None;
        i += 1;
        while i < lines.len() {
            if is_heading_line(&lines[i]) {
                break;
            }
            if is_end_marker(&lines[i]) {
                end = Some(i);
            } else if is_start_marker(&lines[i]) && end.is_some() {
                break;
            }
            i += 1;
        }

        match end {
            Some(end) => blocks.push(TocBlock { start, end }),
            None => {
                blocks.push(TocBlock { start, end: start });
                i = start + 1;
            }
        }
    }

    blocks
}

/// Bare end marker lines that do not belong to any detected block.
fn find_orphan_end_markers(lines: &[String], blocks: &[TocBlock]) -> Vec<TocBlock> {
    lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| {
            is_bare_end_marker(line)
                && !blocks
                    .iter()
                    .any(|block| block.start <= *idx && *idx <= block.end)
        })
        .map(|(idx, _)| TocBlock {
            start: idx,
            end: idx,
        })
        .collect()
}

/// Renders a fresh TOC block, trailing blank line included.
pub fn build_toc_lines(lines: &[String], max_depth: u8) -> Vec<String> {
    let depth = effective_depth(max_depth);
    let mut out = vec![
        MARK_START_HTML.to_string(),
        MARK_START_COMMENT.to_string(),
        QUICK_JUMP.to_string(),
    ];

    let mut any = false;
    for heading in parse_headings(lines) {
        if heading.level < 2 || heading.level > depth {
            continue;
        }
        any = true;
        let indent = "  ".repeat(usize::from(heading.level - 2));
        out.push(format!(
            "> {indent}- [[#{text}|{text}]]",
            text = heading.text
        ));
    }
    if !any {
        out.push(NO_HEADINGS.to_string());
    }

    out.push(MARK_END_HTML.to_string());
    out.push(MARK_END_COMMENT.to_string());
    out.push(String::new());
    out
}

/// Keeps exactly one canonical TOC block at `top_at + 2` when the document
/// has sections in range, and none otherwise.
pub fn upsert_toc(lines: &mut Vec<String>, top_at: usize, max_depth: u8) {
    let depth = effective_depth(max_depth);
    let heads = parse_headings(lines);
    let expected = top_at + 2;

    let blocks = find_toc_blocks(lines);
    let orphans = find_orphan_end_markers(lines, &blocks);

    if !has_sections(&heads, depth) {
        if !blocks.is_empty() || !orphans.is_empty() {
            debug!(blocks = blocks.len(), "removing toc from document without sections");
        }
        let mut spans = blocks;
        spans.extend(orphans);
        remove_spans(lines, spans);
        return;
    }

    let fresh = build_toc_lines(lines, depth);

    if let [only] = blocks.as_slice() {
        let rendered = &fresh[..fresh.len() - 1];
        if orphans.is_empty() && only.start == expected && lines[only.start..=only.end] == *rendered {
            return;
        }
    }

    debug!(
        blocks = blocks.len(),
        orphans = orphans.len(),
        "rewriting toc block"
    );
    let mut spans = blocks;
    spans.extend(orphans);
    let shift: usize = spans.iter().map(|span| span.lines_before(expected)).sum();
    remove_spans(lines, spans);
    insert_lines(lines, expected - shift, fresh);
}

fn remove_spans(lines: &mut Vec<String>, mut spans: Vec<TocBlock>) {
    spans.sort_by(|a, b| b.start.cmp(&a.start));
    for span in spans {
        lines.drain(span.start..=span.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    fn count(doc: &[String], needle: &str) -> usize {
        doc.iter().filter(|line| line.as_str() == needle).count()
    }

    #[test]
    fn markers_match_both_syntaxes() {
        assert!(is_start_marker(MARK_START_HTML));
        assert!(is_start_marker(MARK_START_COMMENT));
        assert!(is_start_marker("<!--MDNAV:TOC START-->"));
        assert!(is_end_marker(MARK_END_HTML));
        assert!(is_end_marker(MARK_END_COMMENT));
        assert!(!is_end_marker(MARK_START_HTML));
        assert!(!is_start_marker("MDNAV:TOC START"));
    }

    #[test]
    fn depth_defaults_and_clamps() {
        assert_eq!(effective_depth(0), 4);
        assert_eq!(effective_depth(3), 3);
        assert_eq!(effective_depth(9), 6);
    }

    #[test]
    fn blocks_extend_to_last_end_marker() {
        let doc = lines(&[
            MARK_START_HTML,
            MARK_START_COMMENT,
            "> - [[#A|A]]",
            MARK_END_HTML,
            MARK_END_COMMENT,
            MARK_END_COMMENT,
            "",
            "## A",
        ]);
        assert_eq!(find_toc_blocks(&doc), vec![TocBlock { start: 0, end: 5 }]);
    }

    #[test]
    fn new_start_after_an_end_opens_a_new_block() {
        let doc = lines(&[
            MARK_START_HTML,
            MARK_END_HTML,
            "text",
            MARK_START_HTML,
            MARK_END_HTML,
        ]);
        assert_eq!(
            find_toc_blocks(&doc),
            vec![TocBlock { start: 0, end: 1 }, TocBlock { start: 3, end: 4 }]
        );
    }

    #[test]
    fn headings_close_the_block_scan() {
        let doc = lines(&[
            MARK_START_HTML,
            "> - [[#A|A]]",
            MARK_END_HTML,
            "## A",
            "body",
            MARK_END_HTML,
        ]);
        assert_eq!(find_toc_blocks(&doc), vec![TocBlock { start: 0, end: 2 }]);

        let doc = lines(&[MARK_START_HTML, "## A", MARK_END_HTML]);
        assert_eq!(find_toc_blocks(&doc), vec![TocBlock { start: 0, end: 0 }]);

        let doc = lines(&[MARK_START_HTML, "## %% MDNAV:TOC END %%", "body"]);
        assert_eq!(find_toc_blocks(&doc), vec![TocBlock { start: 0, end: 0 }]);
    }

    #[test]
    fn unterminated_starts_become_degenerate_blocks() {
        let doc = lines(&[MARK_START_HTML, MARK_START_COMMENT, "text"]);
        assert_eq!(
            find_toc_blocks(&doc),
            vec![TocBlock { start: 0, end: 0 }, TocBlock { start: 1, end: 1 }]
        );
    }

    #[test]
    fn build_nests_by_level_and_respects_depth() {
        let doc = lines(&["# T", "## A", "### B", "#### C"]);
        let toc = build_toc_lines(&doc, 3);
        assert_eq!(
            toc,
            lines(&[
                MARK_START_HTML,
                MARK_START_COMMENT,
                QUICK_JUMP,
                "> - [[#A|A]]",
                ">   - [[#B|B]]",
                MARK_END_HTML,
                MARK_END_COMMENT,
                "",
            ])
        );
    }

    #[test]
    fn build_without_sections_emits_placeholder() {
        let toc = build_toc_lines(&lines(&["# T", "body"]), 4);
        assert!(toc.contains(&NO_HEADINGS.to_string()));
    }

    #[test]
    fn upsert_builds_nested_toc_under_anchor() {
        let mut doc = lines(&[
            "---", "---", "", "# Title", "", "^top", "", "## One", "Text", "### One.1", "Text",
            "## Two", "Text",
        ]);
        upsert_toc(&mut doc, 5, 4);
        assert_eq!(doc[7], MARK_START_HTML);
        assert!(doc.contains(&"> - [[#One|One]]".to_string()));
        assert!(doc.contains(&">   - [[#One.1|One.1]]".to_string()));
        assert!(doc.contains(&"> - [[#Two|Two]]".to_string()));
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut doc = lines(&["# T", "", "^top", "", "## A"]);
        upsert_toc(&mut doc, 2, 6);
        let once = doc.clone();
        upsert_toc(&mut doc, 2, 6);
        assert_eq!(doc, once);
        assert_eq!(count(&doc, MARK_START_HTML), 1);
    }

    #[test]
    fn upsert_collapses_duplicate_end_markers() {
        let mut doc = lines(&[
            "# Title",
            "",
            "^top",
            "",
            MARK_START_HTML,
            MARK_START_COMMENT,
            QUICK_JUMP,
            "> - [[#A|A]]",
            MARK_END_HTML,
            MARK_END_COMMENT,
            MARK_END_COMMENT,
            "",
            "## A",
            "text",
        ]);
        upsert_toc(&mut doc, 2, 4);
        assert_eq!(count(&doc, MARK_START_HTML), 1);
        assert_eq!(count(&doc, MARK_START_COMMENT), 1);
        assert_eq!(count(&doc, MARK_END_HTML), 1);
        assert_eq!(count(&doc, MARK_END_COMMENT), 1);
        assert_eq!(doc[4], MARK_START_HTML);
    }

    #[test]
    fn upsert_replaces_stale_block_contents() {
        let mut doc = lines(&[
            "# T",
            "",
            "^top",
            "",
            MARK_START_HTML,
            "- [[#Old|Old]]",
            MARK_END_HTML,
            "",
            "## A",
        ]);
        upsert_toc(&mut doc, 2, 6);
        assert_eq!(count(&doc, MARK_START_HTML), 1);
        assert!(doc.contains(&"> - [[#A|A]]".to_string()));
        assert!(!doc.contains(&"- [[#Old|Old]]".to_string()));
    }

    #[test]
    fn upsert_removes_toc_when_no_sections_in_range() {
        let mut doc = lines(&[
            "# T",
            "",
            "^top",
            "",
            MARK_START_HTML,
            "> - [[#Deep|Deep]]",
            MARK_END_HTML,
            "",
            "### Deep",
        ]);
        upsert_toc(&mut doc, 2, 2);
        assert_eq!(doc, lines(&["# T", "", "^top", "", "", "### Deep"]));
    }

    #[test]
    fn upsert_removes_orphan_end_markers() {
        let mut doc = lines(&["# T", "", "^top", "", "## A", MARK_END_COMMENT, "body"]);
        upsert_toc(&mut doc, 2, 4);
        assert_eq!(count(&doc, MARK_END_COMMENT), 1);
        assert_eq!(doc[4], MARK_START_HTML);
        assert_eq!(doc.last().map(String::as_str), Some("body"));
    }

    #[test]
    fn marker_mentions_in_prose_and_headings_are_kept() {
        let mention = "Closes with `<!-- MDNAV:TOC END -->` on its own line.";
        let heading = "## %% MDNAV:TOC END %%";
        let mut doc = lines(&["# T", "", "^top", "", "## A", mention, heading, "body"]);
        upsert_toc(&mut doc, 2, 4);
        assert!(doc.contains(&mention.to_string()));
        assert!(doc.contains(&heading.to_string()));
        assert_eq!(count(&doc, MARK_END_HTML), 1);

        let once = doc.clone();
        upsert_toc(&mut doc, 2, 4);
        assert_eq!(doc, once);
    }

    #[test]
    fn bare_end_marker_ignores_surrounding_text() {
        assert!(is_bare_end_marker("  <!--MDNAV:TOC END-->  "));
        assert!(is_bare_end_marker(MARK_END_COMMENT));
        assert!(!is_bare_end_marker("see `%% MDNAV:TOC END %%`"));
        assert!(is_end_marker("see `%% MDNAV:TOC END %%`"));
    }

    #[test]
    fn block_above_anchor_moves_below_it() {
        let mut doc = lines(&[
            MARK_START_HTML,
            MARK_END_HTML,
            "# T",
            "",
            "^top",
            "",
            "## A",
        ]);
        upsert_toc(&mut doc, 4, 4);
        assert_eq!(doc[0], "# T");
        assert_eq!(doc[2], "^top");
        assert_eq!(doc[4], MARK_START_HTML);
    }
}
