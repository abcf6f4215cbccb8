use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Types
// =============================================================================

/// An ATX heading found in the current line sequence.
///
/// Headings are never cached across pipeline stages: every stage re-parses
/// after the previous one mutated the lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub line_index: usize,
    pub level: u8,
    pub text: String,
}

/// Line indices of the opening and closing `---` delimiters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontmatterSpan {
    pub start: usize,
    pub end: usize,
}

// =============================================================================
// Regex Patterns
// =============================================================================

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)").expect("valid heading regex"));
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+(.+)").expect("valid h1 regex"));
static TRAILING_HASHES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*#*\s*$").expect("valid trailing hash regex"));
static SEPARATOR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-_]+").expect("valid separator regex"));
static FRONTMATTER_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---\s*$").expect("valid frontmatter fence regex"));

pub const FALLBACK_TITLE: &str = "Untitled";

// =============================================================================
// Line Model
// =============================================================================

/// Splits on `\n`, dropping the `\r` of every `\r\n` pair. An empty document
/// is one empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let last = lines.len() - 1;
    for line in lines.iter_mut().take(last) {
        if line.ends_with('\r') {
            line.pop();
        }
    }
    lines
}

pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Inserts `insertion` so that its first line lands at `index`, padding the
/// sequence with empty lines when `index` lies past the end.
pub fn insert_lines(lines: &mut Vec<String>, index: usize, insertion: Vec<String>) {
    if index > lines.len() {
        lines.resize(index, String::new());
    }
    lines.splice(index..index, insertion);
}

// =============================================================================
// Headings
// =============================================================================

/// Strips a closing `#` run and the whitespace around it; inner `#` stays.
pub fn trim_trailing_hashes(text: &str) -> String {
    TRAILING_HASHES_RE.replace(text, "").into_owned()
}

/// `my-awesome_note` becomes `My Awesome Note`.
pub fn prettify_title(raw: &str) -> String {
    let spaced = SEPARATOR_RUN_RE.replace_all(raw, " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev: Option<char> = None;
    for ch in spaced.chars() {
        let word_start = matches!(prev, None | Some(' '));
        if word_start && is_word_char(ch) {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Every `#`-prefixed line is a heading, including lines inside code fences.
pub fn parse_headings(lines: &[String]) -> Vec<Heading> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| parse_heading_line(idx, line))
        .collect()
}

pub fn is_heading_line(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

fn parse_heading_line(idx: usize, line: &str) -> Option<Heading> {
    let captures = HEADING_RE.captures(line)?;
    let level = captures.get(1)?.as_str().len() as u8;
    let text = trim_trailing_hashes(captures.get(2)?.as_str());
    Some(Heading {
        line_index: idx,
        level,
        text,
    })
}

/// Last line index owned by `heads[i]`: the line before the next heading of
/// the same or a shallower level, or the last line of the document.
pub fn section_end_index(heads: &[Heading], i: usize, total_lines: usize) -> usize {
    let current = heads[i].level;
    heads
        .iter()
        .skip(i + 1)
        .find(|heading| heading.level <= current)
        .map(|heading| heading.line_index.saturating_sub(1))
        .unwrap_or_else(|| total_lines.saturating_sub(1))
}

pub fn has_sections(heads: &[Heading], max_depth: u8) -> bool {
    heads
        .iter()
        .any(|heading| heading.level >= 2 && heading.level <= max_depth)
}

/// First `# ` heading at or after `from`.
pub fn find_h1(lines: &[String], from: usize) -> Option<(usize, String)> {
    lines.iter().enumerate().skip(from).find_map(|(idx, line)| {
        let captures = H1_RE.captures(line)?;
        Some((idx, trim_trailing_hashes(captures.get(1)?.as_str())))
    })
}

// =============================================================================
// Frontmatter Detection
// =============================================================================

/// Leading blank lines are skipped; an opening fence without a closing one
/// is not frontmatter.
pub fn find_frontmatter(lines: &[String]) -> Option<FrontmatterSpan> {
    let start = lines.iter().position(|line| !is_blank(line))?;
    if !FRONTMATTER_FENCE_RE.is_match(&lines[start]) {
        return None;
    }
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| FRONTMATTER_FENCE_RE.is_match(line))
        .map(|(idx, _)| idx)?;
    Some(FrontmatterSpan { start, end })
}

// =============================================================================
// Tests
// =============================================================================
