//! Comment skipping and header-row location.
//!
//! Archive exports prefix the table with `#` metadata blocks and sometimes
//! a title line; the header is the first line that looks tabular.

use crate::schema::vocabulary::CanonicalColumn;

/// Canonical names whose presence marks a header even without delimiters.
pub const HEADER_KEYWORDS: [CanonicalColumn; 4] = [
    CanonicalColumn::OrbitalPeriod,
    CanonicalColumn::TransitDuration,
    CanonicalColumn::TransitDepth,
    CanonicalColumn::StellarRadius,
];

fn is_comment(line: &str, markers: &[String]) -> bool {
    let trimmed = line.trim_start();
    markers.iter().any(|m| trimmed.starts_with(m.as_str()))
}

/// Index of the first line that is neither blank nor a comment.
///
/// Returns `lines.len()` when every line is skippable.
pub fn first_content_line(lines: &[&str], markers: &[String]) -> usize {
    lines
        .iter()
        .position(|line| !line.trim().is_empty() && !is_comment(line, markers))
        .unwrap_or(lines.len())
}

/// Index of the header row, searching `window` lines from `start`.
///
/// The header is the first non-comment line containing a comma, a tab, or a
/// canonical geometry column name. Falls back to `start`.
pub fn locate_header(lines: &[&str], start: usize, window: usize, markers: &[String]) -> usize {
    let end = lines.len().min(start.saturating_add(window));
    (start..end)
        .find(|&i| {
            let line = lines[i];
            if line.trim().is_empty() || is_comment(line, markers) {
                return false;
            }
            let lower = line.to_ascii_lowercase();
            lower.contains(',')
                || lower.contains('\t')
                || HEADER_KEYWORDS.iter().any(|k| lower.contains(k.name()))
        })
        .unwrap_or(start)
}
