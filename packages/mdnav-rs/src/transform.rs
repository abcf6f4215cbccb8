use tracing::debug;

use crate::anchor::ensure_single_top;
use crate::config::TransformConfig;
use crate::footer::upsert_section_footers;
use crate::frontmatter::{ensure_blank_after, ensure_frontmatter, ensure_h1};
use crate::lines::{join_lines, parse_headings, split_lines};
use crate::toc::upsert_toc;

/// Normalizes the navigation scaffolding of one note.
///
/// Documents with at most one heading are returned untouched, byte for byte.
/// Everything else is rewritten with `\n` line endings. Running the result
/// through `transform` again with the same arguments yields the same text,
/// except for notes that open with a bare `---` rule and no closing fence:
/// the first footer rule then closes it as frontmatter on the next pass.
pub fn transform(text: &str, filename_base: &str, config: &TransformConfig) -> String {
    let mut lines = split_lines(text);
    let heading_count = parse_headings(&lines).len();
    if heading_count <= 1 {
        debug!(heading_count, "nothing to normalize");
        return text.to_string();
    }

    transform_lines(&mut lines, filename_base, &config.normalized());
    join_lines(&lines)
}

/// Runs every pipeline stage over `lines` in place. `config` is used as
/// given, so callers outside `transform` should pass a normalized copy.
pub fn transform_lines(lines: &mut Vec<String>, filename_base: &str, config: &TransformConfig) {
    let fm_end = ensure_frontmatter(lines, config.create_frontmatter);
    let (h1_index, title) = ensure_h1(lines, fm_end, filename_base, config.prettify_h1);
    debug!(h1_index, title = %title, "h1 resolved");

    ensure_blank_after(lines, h1_index);
    let top_at = ensure_single_top(lines, h1_index + 2);
    upsert_toc(lines, top_at, config.max_depth);
    upsert_section_footers(lines, &config.footer_levels, &config.hr);
}
