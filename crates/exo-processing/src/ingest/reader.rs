//! CSV parsing with fallbacks.
//!
//! Every cell is read as a string (schema inference is disabled) so that
//! numeric coercion happens later, per field, with proper error reporting.

use crate::error::{ReconcileError, Result};
use crate::types::ParseStrategy;
use crate::utils::sanitize_column_name;
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{debug, warn};

/// Separators considered when sniffing the header line.
pub const CANDIDATE_SEPARATORS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Split one line on `separator`, honouring double quotes.
pub fn split_fields(line: &str, separator: u8) -> Vec<String> {
    let sep = separator as char;
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Pick the candidate separator that splits the header into the most fields.
pub fn sniff_separator(header: &str) -> u8 {
    CANDIDATE_SEPARATORS
        .iter()
        .copied()
        .max_by_key(|sep| {
            let count = split_fields(header, *sep).len();
            // Prefer comma on ties.
            (count, *sep == b',')
        })
        .filter(|sep| split_fields(header, *sep).len() > 1)
        .unwrap_or(b',')
}

/// Sanitize header names, name blank ones and make duplicates unique.
pub fn normalize_header(header: &str, separator: u8) -> String {
    let mut seen = HashSet::new();
    let names: Vec<String> = split_fields(header, separator)
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let base = match sanitize_column_name(raw) {
                name if name.is_empty() => format!("column_{}", i + 1),
                name => name,
            };
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.to_ascii_lowercase()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            name
        })
        .collect();

    let sep = separator as char;
    names
        .into_iter()
        .map(|name| {
            if name.contains(sep) || name.contains('"') {
                format!("\"{}\"", name.replace('"', "\"\""))
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_frame(content: String, separator: u8, permissive: bool) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_ignore_errors(permissive)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(permissive),
        )
        .into_reader_with_file_handle(Cursor::new(content.into_bytes()))
        .finish()
}

/// Parse `lines` (header first) into a frame of string columns.
///
/// Tries strict parsing with the sniffed separator, then permissive parsing
/// that truncates ragged lines and skips bad records, then permissive
/// parsing over cleaned content.
pub fn parse_lines(lines: &[&str]) -> Result<(DataFrame, ParseStrategy)> {
    let Some((header, rows)) = lines.split_first() else {
        return Err(ReconcileError::ParseFailure("no header line".to_string()));
    };
    let separator = sniff_separator(header);
    debug!("Using separator {:?}", separator as char);

    let mut content = normalize_header(header, separator);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');

    match read_frame(content.clone(), separator, false) {
        Ok(df) => return Ok((df, ParseStrategy::Standard)),
        Err(e) => debug!("Standard parsing failed: {}", e),
    }

    match read_frame(content.clone(), separator, true) {
        Ok(df) => {
            warn!("CSV parsed permissively; ragged or malformed lines were truncated or skipped");
            return Ok((df, ParseStrategy::Permissive));
        }
        Err(e) => debug!("Permissive parsing failed: {}", e),
    }

    read_frame(clean_csv_content(&content), separator, true)
        .map(|df| {
            warn!("CSV parsed after cleaning quotes and blank lines");
            (df, ParseStrategy::Cleaned)
        })
        .map_err(|e| ReconcileError::ParseFailure(e.to_string()))
}
