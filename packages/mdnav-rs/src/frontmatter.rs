use tracing::debug;

use crate::lines::{find_frontmatter, find_h1, insert_lines, prettify_title, FALLBACK_TITLE};

const FRONTMATTER_FENCE: &str = "---";

/// Returns the index of the closing frontmatter delimiter.
///
/// When no block exists and `create` is set, an empty block plus one blank
/// line is inserted at the top and `Some(1)` is returned. `None` means the
/// document has no frontmatter and none was created.
pub fn ensure_frontmatter(lines: &mut Vec<String>, create: bool) -> Option<usize> {
    if let Some(span) = find_frontmatter(lines) {
        return Some(span.end);
    }
    if !create {
        return None;
    }
    debug!("creating empty frontmatter block");
    insert_lines(
        lines,
        0,
        vec![
            FRONTMATTER_FENCE.to_string(),
            FRONTMATTER_FENCE.to_string(),
            String::new(),
        ],
    );
    Some(1)
}

/// Finds the first H1 after the frontmatter, or synthesizes one from the
/// filename. Returns the heading's line index and its text.
pub fn ensure_h1(
    lines: &mut Vec<String>,
    fm_end: Option<usize>,
    filename_base: &str,
    prettify: bool,
) -> (usize, String) {
    let after_fm = fm_end.map_or(0, |end| end + 1);
    if let Some(found) = find_h1(lines, after_fm) {
        return found;
    }

    let raw = if filename_base.is_empty() {
        FALLBACK_TITLE
    } else {
        filename_base
    };
    let title = if prettify {
        prettify_title(raw)
    } else {
        raw.to_string()
    };
    debug!(title = %title, "synthesizing missing h1");

    let needs_gap = lines.get(after_fm).is_some_and(|line| !line.is_empty());
    if needs_gap {
        lines.insert(after_fm, String::new());
    }
    let h1_index = after_fm + 1;
    insert_lines(lines, h1_index, vec![format!("# {title}"), String::new()]);
    (h1_index, title)
}

/// Inserts one empty line after `idx` unless the next line is already empty
/// or missing. Existing runs of blanks are left alone.
pub fn ensure_blank_after(lines: &mut Vec<String>, idx: usize) {
    if lines.get(idx + 1).is_some_and(|line| !line.is_empty()) {
        lines.insert(idx + 1, String::new());
    }
}
