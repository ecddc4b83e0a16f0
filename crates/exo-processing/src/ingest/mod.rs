//! Turning uploaded bytes into a [`RawTable`].
//!
//! Decode, skip leading comments, find the header row, parse. Nothing here
//! knows about catalog schemas.

pub mod encoding;
pub mod header;
pub mod reader;

pub use encoding::{DecodedText, decode};
pub use header::{first_content_line, locate_header};
pub use reader::parse_lines;

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::table::RawTable;
use crate::types::ParseStrategy;
use crate::utils::truncate_str;
use serde::Serialize;
use tracing::info;

/// Maximum characters of the header line kept for diagnostics.
const HEADER_PREVIEW_CHARS: usize = 200;

/// What ingestion learned about the file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub encoding: String,
    pub decode_errors: bool,
    pub start_line_index: usize,
    pub header_line_index: usize,
    pub header_line_preview: String,
    pub parse_strategy: ParseStrategy,
    pub original_columns: Vec<String>,
}

/// Decode and parse a catalog file.
///
/// # Errors
///
/// `EmptyTable` when the file has no header or no data rows,
/// `TooManyRows` when it exceeds `config.max_rows`, and `ParseFailure`
/// when every parsing strategy fails.
pub fn load_table(bytes: &[u8], config: &ReconcileConfig) -> Result<(RawTable, IngestReport)> {
    let decoded = decode(bytes, config.fallback_encoding());
    let lines: Vec<&str> = decoded.text.lines().collect();

    let start = first_content_line(&lines, &config.comment_markers);
    if start >= lines.len() {
        return Err(ReconcileError::EmptyTable);
    }
    let header_index = locate_header(
        &lines,
        start,
        config.header_search_window,
        &config.comment_markers,
    );

    let body: Vec<&str> = lines[header_index..]
        .iter()
        .copied()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty()
                && !config
                    .comment_markers
                    .iter()
                    .any(|m| trimmed.starts_with(m.as_str()))
        })
        .collect();

    let (frame, strategy) = parse_lines(&body)?;
    let table = RawTable::new(frame);

    if table.is_empty() {
        return Err(ReconcileError::EmptyTable);
    }
    if let Some(limit) = config.max_rows
        && table.height() > limit
    {
        return Err(ReconcileError::TooManyRows {
            rows: table.height(),
            limit,
        });
    }

    let report = IngestReport {
        encoding: decoded.encoding.to_string(),
        decode_errors: decoded.had_errors,
        start_line_index: start,
        header_line_index: header_index,
        header_line_preview: truncate_str(lines[header_index], HEADER_PREVIEW_CHARS),
        parse_strategy: strategy,
        original_columns: table.column_names(),
    };

    info!(
        "Loaded {} rows x {} columns (header at line {}, {})",
        table.height(),
        table.width(),
        header_index,
        report.encoding
    );
    Ok((table, report))
}
