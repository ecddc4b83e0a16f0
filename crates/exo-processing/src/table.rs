//! Parsed catalog table.
//!
//! [`RawTable`] wraps a polars [`DataFrame`] whose parsed columns are all
//! strings; columns added during derivation are `Float64`. Column names keep
//! their original case but every lookup is case-insensitive.

use crate::utils::{is_missing_marker, json_number};
use polars::prelude::*;
use serde_json::{Map, Value};

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn from_any_value(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Cell::Empty,
            AnyValue::String(s) => Cell::from_text(s),
            AnyValue::StringOwned(s) => Cell::from_text(s.as_str()),
            other => match other.try_extract::<f64>() {
                Ok(v) => Cell::Number(v),
                Err(_) => Cell::from_text(&other.to_string()),
            },
        }
    }

    fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// True for empty cells, `NaN` and missing-value markers.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(s) => is_missing_marker(s),
        }
    }

    /// JSON-safe rendering; non-finite numbers become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Number(v) => json_number(*v),
            Cell::Text(s) => Value::from(s.as_str()),
        }
    }
}

/// Tabular catalog data plus unit provenance.
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
    depth_normalized: bool,
}

impl RawTable {
    /// Wrap a freshly parsed frame. Depth values are assumed to still be in
    /// their source units.
    pub fn new(frame: DataFrame) -> Self {
        Self {
            frame,
            depth_normalized: false,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Whether transit depth has already been converted to a fraction.
    pub fn depth_normalized(&self) -> bool {
        self.depth_normalized
    }

    pub(crate) fn mark_depth_normalized(&mut self) {
        self.depth_normalized = true;
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Actual name of the column matching `name` case-insensitively.
    pub fn find_column(&self, name: &str) -> Option<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .find(|col| col.as_str().eq_ignore_ascii_case(name))
            .map(|col| col.to_string())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// First of `candidates` present in the table, as its actual name.
    pub fn find_first(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|c| self.find_column(c))
    }

    /// Cell at `row` of the column matching `name`; absent columns read as empty.
    pub fn cell(&self, row: usize, name: &str) -> Cell {
        let Some(actual) = self.find_column(name) else {
            return Cell::Empty;
        };
        self.frame
            .column(&actual)
            .and_then(|col| col.as_materialized_series().get(row))
            .map(Cell::from_any_value)
            .unwrap_or(Cell::Empty)
    }

    /// All cells of a row keyed by column name, JSON-safe.
    pub fn row_snapshot(&self, row: usize) -> Map<String, Value> {
        self.frame
            .get_columns()
            .iter()
            .map(|col| {
                let cell = col
                    .as_materialized_series()
                    .get(row)
                    .map(Cell::from_any_value)
                    .unwrap_or(Cell::Empty);
                (col.name().to_string(), cell.to_json())
            })
            .collect()
    }

    /// Column parsed permissively to numbers: unparseable, missing and
    /// non-finite values become `None`. Absent columns yield `None`.
    pub fn numeric_column(&self, name: &str) -> PolarsResult<Option<Vec<Option<f64>>>> {
        let Some(actual) = self.find_column(name) else {
            return Ok(None);
        };
        let series = self.frame.column(&actual)?.as_materialized_series();

        let values = match series.dtype() {
            DataType::String => series
                .str()?
                .into_iter()
                .map(|v| v.and_then(crate::utils::parse_finite))
                .collect(),
            _ => {
                let cast = series.cast(&DataType::Float64)?;
                cast.f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect()
            }
        };
        Ok(Some(values))
    }

    /// Add or replace a `Float64` column.
    pub fn set_numeric_column(&mut self, name: &str, values: Vec<Option<f64>>) -> PolarsResult<()> {
        let series = Series::new(name.into(), values);
        self.frame.with_column(series)?;
        Ok(())
    }

    /// Replace a column's values with text, keeping it a string column.
    pub(crate) fn set_text_column(&mut self, name: &str, values: Vec<Option<String>>) -> PolarsResult<()> {
        let series = Series::new(name.into(), values);
        self.frame.with_column(series)?;
        Ok(())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: &str) -> PolarsResult<()> {
        self.frame.rename(from, to.into())?;
        Ok(())
    }

    /// Raw cells of a column as optional strings, for columns read as text.
    pub(crate) fn text_column(&self, name: &str) -> PolarsResult<Option<Vec<Option<String>>>> {
        let Some(actual) = self.find_column(name) else {
            return Ok(None);
        };
        let series = self.frame.column(&actual)?.as_materialized_series();
        let values = match series.dtype() {
            DataType::String => series
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect(),
            _ => series
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect(),
        };
        Ok(Some(values))
    }
}
