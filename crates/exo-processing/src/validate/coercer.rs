//! Per-row coercion of canonical fields to finite numbers.

use crate::derive::rule_for;
use crate::error::RowError;
use crate::schema::vocabulary::CanonicalColumn;
use crate::table::{Cell, RawTable};
use crate::utils::{finite, parse_finite, parse_numeric_string};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One row of a table plus the fields already resolved for it.
///
/// Resolved values take precedence over raw cells when a derivation rule
/// looks up its inputs, so ratios see derived and defaulted geometry.
#[derive(Debug)]
pub struct RowView<'a> {
    table: &'a RawTable,
    index: usize,
    resolved: BTreeMap<CanonicalColumn, f64>,
}

impl<'a> RowView<'a> {
    pub fn new(table: &'a RawTable, index: usize) -> Self {
        Self {
            table,
            index,
            resolved: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cell(&self, column: &str) -> Cell {
        self.table.cell(self.index, column)
    }

    /// JSON-safe copy of the raw row for error reports.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.table.row_snapshot(self.index)
    }

    pub fn record(&mut self, column: CanonicalColumn, value: f64) {
        self.resolved.insert(column, value);
    }

    pub fn resolved(&self, column: CanonicalColumn) -> Option<f64> {
        self.resolved.get(&column).copied()
    }

    /// Finite value of `name` for this row: resolved first, then the raw cell.
    pub fn lookup(&self, name: &str) -> Option<f64> {
        if let Some(value) = CanonicalColumn::from_name(name).and_then(|c| self.resolved(c)) {
            return Some(value);
        }
        match self.cell(name) {
            Cell::Number(v) => finite(v),
            Cell::Text(s) => parse_finite(&s),
            Cell::Empty => None,
        }
    }
}

/// Coerce `field` of `row` to a finite number.
///
/// 1. A present, numeric cell is returned as is.
/// 2. A missing cell (empty, `NaN`, or a missing marker) is derived from
///    the row's other values when the field has a derivation rule.
/// 3. Otherwise `default` is used when given.
/// 4. Otherwise the row fails with [`RowError::MissingValue`].
///
/// A present cell that is not a finite number fails with
/// [`RowError::InvalidNumber`] regardless of any default.
pub fn coerce_field(
    row: &RowView<'_>,
    field: CanonicalColumn,
    default: Option<f64>,
) -> Result<f64, RowError> {
    let cell = row.cell(field.name());

    if !cell.is_missing() {
        let parsed = match &cell {
            Cell::Number(v) => finite(*v),
            Cell::Text(s) => parse_numeric_string(s).and_then(finite),
            Cell::Empty => None,
        };
        return parsed.ok_or_else(|| RowError::InvalidNumber {
            field: field.name().to_string(),
            value: cell.to_json(),
            row_sample: row.snapshot(),
        });
    }

    if let Some(value) = rule_for(field).and_then(|rule| rule.evaluate_row(|name| row.lookup(name))) {
        debug!("Row {}: derived '{}' = {}", row.index(), field, value);
        return Ok(value);
    }

    default.ok_or_else(|| RowError::MissingValue {
        field: field.name().to_string(),
        row_sample: row.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(columns: &[(&str, &[&str])]) -> RawTable {
        let series: Vec<Column> = columns
            .iter()
            .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
            .collect();
        RawTable::new(DataFrame::new(series).unwrap())
    }

    #[test]
    fn test_present_value() {
        let t = table(&[("orbital_period", &["12.3"])]);
        let row = RowView::new(&t, 0);
        assert_eq!(coerce_field(&row, CanonicalColumn::OrbitalPeriod, None), Ok(12.3));
    }

    #[test]
    fn test_invalid_number_ignores_default() {
        let t = table(&[("orbital_period", &["abc"]), ("kepid", &["42"])]);
        let row = RowView::new(&t, 0);
        let err = coerce_field(&row, CanonicalColumn::OrbitalPeriod, Some(1.0)).unwrap_err();

        match err {
            RowError::InvalidNumber {
                field,
                value,
                row_sample,
            } => {
                assert_eq!(field, "orbital_period");
                assert_eq!(value, Value::from("abc"));
                assert_eq!(row_sample["kepid"], Value::from("42"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_infinity_is_invalid() {
        let t = table(&[("stellar_radius", &["inf"])]);
        let row = RowView::new(&t, 0);
        assert!(matches!(
            coerce_field(&row, CanonicalColumn::StellarRadius, None),
            Err(RowError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_missing_uses_default() {
        let t = table(&[("stellar_mass", &[""])]);
        let row = RowView::new(&t, 0);
        assert_eq!(coerce_field(&row, CanonicalColumn::StellarMass, Some(1.0)), Ok(1.0));
    }

    #[test]
    fn test_missing_without_default() {
        let t = table(&[("stellar_radius", &["NaN"]), ("kepid", &["7"])]);
        let row = RowView::new(&t, 0);
        let err = coerce_field(&row, CanonicalColumn::StellarRadius, None).unwrap_err();
        assert!(matches!(err, RowError::MissingValue { ref field, .. } if field == "stellar_radius"));
    }

    #[test]
    fn test_missing_depth_is_derived_per_row() {
        let t = table(&[
            ("transit_depth", &["0.002", ""]),
            ("pl_rade", &["9.9", "1.5"]),
            ("st_rad", &["1.0", "1.0"]),
        ]);
        let first = RowView::new(&t, 0);
        assert_eq!(coerce_field(&first, CanonicalColumn::TransitDepth, None), Ok(0.002));

        let second = RowView::new(&t, 1);
        let depth = coerce_field(&second, CanonicalColumn::TransitDepth, None).unwrap();
        assert!((depth - 0.00018858155625).abs() < 1e-12);
    }

    #[test]
    fn test_underivable_depth_is_missing() {
        let t = table(&[("transit_depth", &[""]), ("pl_rade", &["1.5"]), ("st_rad", &["0"])]);
        let row = RowView::new(&t, 0);
        assert!(matches!(
            coerce_field(&row, CanonicalColumn::TransitDepth, None),
            Err(RowError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_ratio_uses_resolved_values() {
        let t = table(&[("orbital_period", &["10"])]);
        let mut row = RowView::new(&t, 0);
        row.record(CanonicalColumn::OrbitalPeriod, 10.0);
        row.record(CanonicalColumn::TransitDuration, 4.0);
        assert_eq!(
            coerce_field(&row, CanonicalColumn::PeriodDurationRatio, Some(5.0)),
            Ok(2.5)
        );
    }
}
