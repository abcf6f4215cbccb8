use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::lines::{is_blank, parse_headings, section_end_index, Heading};

pub const BACK_TO_TOP: &str = "[[#^top|↩️ Back to Top]]";
pub const DEFAULT_HR: &str = "---";

static FOOTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\[#\s*\^?top\|\s*↩️\s*Back to Top\]\]$").expect("valid footer regex")
});

/// Also accepts hand-edited variants (`#top`, extra spaces).
pub fn is_footer_line(line: &str) -> bool {
    FOOTER_RE.is_match(line)
}

/// The rule line actually emitted for a configured `hr`. Empty or
/// heading-shaped values fall back to `---`, since a rule that parses as a
/// heading would open a new section on the next pass.
pub fn footer_hr(hr: &str) -> &str {
    if hr.is_empty() || !parse_headings(&[hr.to_string()]).is_empty() {
        DEFAULT_HR
    } else {
        hr
    }
}

fn hr_matcher(hr: &str) -> Regex {
    Regex::new(&format!(r"^{}\s*$", regex::escape(hr))).expect("escaped hr is a valid regex")
}

/// Leaves exactly one back-to-top footer at the end of every section whose
/// heading level is listed in `footer_levels`.
///
/// Existing footers inside configured sections are stripped first. Fresh
/// footers are then inserted walking headings last to first, so a nested
/// section's footer always precedes its parent's when both sections end on
/// the same line.
pub fn upsert_section_footers(lines: &mut Vec<String>, footer_levels: &[u8], hr: &str) {
    let heads = parse_headings(lines);
    if heads.is_empty() || footer_levels.is_empty() {
        return;
    }

    let hr_line = footer_hr(hr);
    let stripped = strip_footers(lines, &heads, footer_levels, &hr_matcher(hr_line));
    if stripped > 0 {
        debug!(stripped, "removed existing footers");
    }

    let mut heads = parse_headings(lines);
    for i in (0..heads.len()).rev() {
        if !footer_levels.contains(&heads[i].level) {
            continue;
        }

        let sec_end = section_end_index(&heads, i, lines.len());
        let mut footer = Vec::with_capacity(4);
        if !is_blank(&lines[sec_end]) {
            footer.push(String::new());
        }
        footer.push(BACK_TO_TOP.to_string());
        footer.push(String::new());
        footer.push(hr_line.to_string());

        let at = sec_end + 1;
        let inserted = footer.len();
        lines.splice(at..at, footer);
        for later in heads.iter_mut().skip(i + 1) {
            if later.line_index >= at {
                later.line_index += inserted;
            }
        }
    }
}

/// Removes every footer unit found inside a configured section. A unit is the
/// footer line, plus any blank lines and one rule line directly after it when
/// such a rule follows. Units separated only by blank lines are removed
/// together so that stacked footers leave no blank residue.
fn strip_footers(
    lines: &mut Vec<String>,
    heads: &[Heading],
    footer_levels: &[u8],
    hr_re: &Regex,
) -> usize {
    let bounds = section_bounds(lines.len(), heads, footer_levels);
    let next_non_blank = |from: usize, limit: usize| {
        (from..=limit).find(|&idx| !is_blank(&lines[idx]))
    };

    let mut spans = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let limit = match bounds[idx] {
            Some(limit) if is_footer_line(&lines[idx]) => limit,
            _ => {
                idx += 1;
                continue;
            }
        };

        let start = idx;
        let mut end = idx;
        loop {
            if let Some(next) = next_non_blank(end + 1, limit) {
                if hr_re.is_match(&lines[next]) {
                    end = next;
                }
            }
            match next_non_blank(end + 1, limit) {
                Some(next) if is_footer_line(&lines[next]) => end = next,
                _ => break,
            }
        }
        spans.push((start, end));
        idx = end + 1;
    }

    let count = spans.len();
    for (start, end) in spans.into_iter().rev() {
        lines.drain(start..=end);
    }
    count
}

/// For each line inside at least one configured section (heading line
/// excluded), the furthest section end covering it.
fn section_bounds(total: usize, heads: &[Heading], footer_levels: &[u8]) -> Vec<Option<usize>> {
    let mut bounds = vec![None; total];
    for (i, heading) in heads.iter().enumerate() {
        if !footer_levels.contains(&heading.level) {
            continue;
        }
        let sec_end = section_end_index(heads, i, total);
        for bound in bounds
            .iter_mut()
            .take(sec_end + 1)
            .skip(heading.line_index + 1)
        {
            *bound = Some(bound.map_or(sec_end, |current: usize| current.max(sec_end)));
        }
    }
    bounds
}
