use tracing::debug;

use crate::lines::insert_lines;

pub const TOP_ANCHOR: &str = "^top";

/// Leaves exactly one `^top` line, at `canonical_index`, followed by one
/// empty line. Returns the anchor's final index.
///
/// Strays are removed from the highest index downward. Strays sitting above
/// `canonical_index` can only precede the H1, so each one removed there
/// shifts the canonical slot up by one line.
pub fn ensure_single_top(lines: &mut Vec<String>, canonical_index: usize) -> usize {
    let positions: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.as_str() == TOP_ANCHOR)
        .map(|(idx, _)| idx)
        .collect();

    let mut target = canonical_index;
    for &idx in positions.iter().rev() {
        if idx == canonical_index {
            continue;
        }
        lines.remove(idx);
        if idx < canonical_index {
            target -= 1;
        }
    }
    if positions.len() > 1 || positions.first().is_some_and(|&idx| idx != canonical_index) {
        debug!(found = positions.len(), "removed stray top anchors");
    }

    if lines.get(target).map(String::as_str) != Some(TOP_ANCHOR) {
        insert_lines(lines, target, vec![TOP_ANCHOR.to_string()]);
    }
    if lines.get(target + 1).is_some_and(|line| !line.is_empty()) {
        lines.insert(target + 1, String::new());
    }
    target
}
