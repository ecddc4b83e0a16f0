//! Shared helpers for parsing catalog cells and names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Characters that may appear inside a formatted number and carry no value.
pub const NUMERIC_FORMAT_CHARS: [char; 3] = [',', ' ', '_'];

/// Markers catalogs and spreadsheets use for "no value".
pub const MISSING_MARKERS: [&str; 10] = [
    "", "nan", "null", "none", "n/a", "na", "#n/a", "missing", "unknown", "--",
];

/// Strip formatting characters before numeric parsing.
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Check if a cell holds a missing-value marker.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Parse a cell as a number, keeping infinities so callers can reject them.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| clean_numeric_string(trimmed).parse::<f64>().ok())
}

/// Parse a cell permissively: unparseable, missing and non-finite all map to `None`.
pub fn parse_finite(s: &str) -> Option<f64> {
    parse_numeric_string(s).filter(|v| v.is_finite())
}

/// Keep a value only if it is finite.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

// =============================================================================
// JSON Helpers
// =============================================================================

/// JSON representation of a float; `NaN` and infinities become `null`.
pub fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// =============================================================================
// Column Names
// =============================================================================

static SURROUNDING_JUNK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[\s"'\u{feff}]+|[\s"']+$"#).expect("Invalid regex: surrounding junk")
});

static INNER_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: inner whitespace"));

/// Normalize a header cell: strip quotes, stray BOMs and padding, and
/// collapse inner whitespace to a single space.
pub fn sanitize_column_name(name: &str) -> String {
    let stripped = SURROUNDING_JUNK.replace_all(name, "");
    INNER_WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// Truncate a string for display, respecting char boundaries.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}
