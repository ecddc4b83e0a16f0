//! Derivation rules for canonical columns.
//!
//! A rule is defined once and evaluated two ways: column-wise over a whole
//! table, or for one row through a lookup closure. Both paths resolve each
//! input the same way: the first candidate column holding a finite value,
//! multiplied by that candidate's unit scale.

use crate::derive::physics::{
    JUPITER_RADIUS_IN_EARTH_RADII, guarded_ratio, transit_depth, transit_duration_hours,
};
use crate::schema::vocabulary::CanonicalColumn;
use crate::table::RawTable;
use polars::prelude::PolarsResult;

/// One input of a rule: candidate source columns with their unit scale.
#[derive(Debug)]
pub struct InputSpec {
    pub name: &'static str,
    pub candidates: &'static [(&'static str, f64)],
    /// Optional inputs may be missing; the formula handles the `None`.
    pub optional: bool,
}

impl InputSpec {
    fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.candidates.iter().map(|(name, _)| *name)
    }

    /// Resolve this input for one row.
    pub fn resolve_row<F>(&self, lookup: &F) -> Option<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        self.candidates
            .iter()
            .find_map(|(name, scale)| lookup(name).map(|v| v * scale))
    }

    /// Resolve this input for every row, coalescing candidate columns.
    pub fn resolve_column(&self, table: &RawTable) -> PolarsResult<Vec<Option<f64>>> {
        let mut merged: Vec<Option<f64>> = vec![None; table.height()];
        for (name, scale) in self.candidates {
            let Some(values) = table.numeric_column(name)? else {
                continue;
            };
            for (slot, value) in merged.iter_mut().zip(values) {
                if slot.is_none() {
                    *slot = value.map(|v| v * scale);
                }
            }
        }
        Ok(merged)
    }
}

const PLANET_RADIUS: InputSpec = InputSpec {
    name: "planet_radius",
    candidates: &[
        ("planet_radius", 1.0),
        ("pl_rade", 1.0),
        ("koi_prad", 1.0),
        ("pl_radj", JUPITER_RADIUS_IN_EARTH_RADII),
    ],
    optional: false,
};

const STELLAR_RADIUS: InputSpec = InputSpec {
    name: "stellar_radius",
    candidates: &[("stellar_radius", 1.0), ("st_rad", 1.0), ("koi_srad", 1.0)],
    optional: false,
};

const ORBITAL_PERIOD: InputSpec = InputSpec {
    name: "orbital_period",
    candidates: &[("orbital_period", 1.0), ("pl_orbper", 1.0), ("koi_period", 1.0)],
    optional: false,
};

const SEMI_MAJOR_AXIS: InputSpec = InputSpec {
    name: "semi_major_axis",
    candidates: &[("semi_major_axis", 1.0), ("pl_orbsmax", 1.0), ("koi_sma", 1.0)],
    optional: true,
};

const TRANSIT_DURATION: InputSpec = InputSpec {
    name: "transit_duration",
    candidates: &[("transit_duration", 1.0)],
    optional: false,
};

const TRANSIT_DEPTH: InputSpec = InputSpec {
    name: "transit_depth",
    candidates: &[("transit_depth", 1.0)],
    optional: false,
};

/// Pure function from resolved inputs (in [`DerivationRule::inputs`] order)
/// to the derived value.
pub type Formula = fn(&[Option<f64>]) -> Option<f64>;

/// How to compute one canonical column from others.
#[derive(Debug)]
pub struct DerivationRule {
    pub target: CanonicalColumn,
    pub inputs: &'static [InputSpec],
    formula: Formula,
}

fn depth_formula(inputs: &[Option<f64>]) -> Option<f64> {
    transit_depth(inputs[0]?, inputs[1]?)
}

fn duration_formula(inputs: &[Option<f64>]) -> Option<f64> {
    transit_duration_hours(inputs[0]?, inputs[1]?, inputs[2])
}

fn ratio_formula(inputs: &[Option<f64>]) -> Option<f64> {
    guarded_ratio(inputs[0]?, inputs[1]?)
}

/// Every rule, in evaluation order: geometry first so that the engineered
/// ratios can use derived depth and duration.
pub static DERIVATION_RULES: [DerivationRule; 6] = [
    DerivationRule {
        target: CanonicalColumn::TransitDepth,
        inputs: &[PLANET_RADIUS, STELLAR_RADIUS],
        formula: depth_formula,
    },
    DerivationRule {
        target: CanonicalColumn::TransitDuration,
        inputs: &[ORBITAL_PERIOD, STELLAR_RADIUS, SEMI_MAJOR_AXIS],
        formula: duration_formula,
    },
    DerivationRule {
        target: CanonicalColumn::PeriodDurationRatio,
        inputs: &[ORBITAL_PERIOD, TRANSIT_DURATION],
        formula: ratio_formula,
    },
    DerivationRule {
        target: CanonicalColumn::TransitSnr,
        inputs: &[TRANSIT_DEPTH, TRANSIT_DURATION],
        formula: ratio_formula,
    },
    DerivationRule {
        target: CanonicalColumn::DepthDurationRatio,
        inputs: &[TRANSIT_DEPTH, TRANSIT_DURATION],
        formula: ratio_formula,
    },
    DerivationRule {
        target: CanonicalColumn::RadiusRatio,
        inputs: &[PLANET_RADIUS, STELLAR_RADIUS],
        formula: ratio_formula,
    },
];

/// Rule producing `target`, if any.
pub fn rule_for(target: CanonicalColumn) -> Option<&'static DerivationRule> {
    DERIVATION_RULES.iter().find(|rule| rule.target == target)
}

impl DerivationRule {
    /// Apply the formula to already-resolved inputs.
    pub fn evaluate(&self, inputs: &[Option<f64>]) -> Option<f64> {
        let complete = self
            .inputs
            .iter()
            .zip(inputs)
            .all(|(spec, value)| spec.optional || value.is_some());
        if !complete || inputs.len() != self.inputs.len() {
            return None;
        }
        (self.formula)(inputs)
    }

    /// Whether the table has at least one candidate column for every
    /// required input.
    pub fn is_available(&self, table: &RawTable) -> bool {
        self.inputs
            .iter()
            .filter(|spec| !spec.optional)
            .all(|spec| spec.column_names().any(|name| table.has_column(name)))
    }

    /// Required inputs with no candidate column in the table.
    pub fn missing_inputs(&self, table: &RawTable) -> Vec<&'static str> {
        self.inputs
            .iter()
            .filter(|spec| !spec.optional)
            .filter(|spec| !spec.column_names().any(|name| table.has_column(name)))
            .map(|spec| spec.name)
            .collect()
    }

    /// Evaluate for every row of `table`.
    pub fn evaluate_column(&self, table: &RawTable) -> PolarsResult<Vec<Option<f64>>> {
        let columns = self
            .inputs
            .iter()
            .map(|spec| spec.resolve_column(table))
            .collect::<PolarsResult<Vec<_>>>()?;

        let values = (0..table.height())
            .map(|row| {
                let inputs: Vec<Option<f64>> = columns.iter().map(|col| col[row]).collect();
                self.evaluate(&inputs)
            })
            .collect();
        Ok(values)
    }

    /// Evaluate for a single row through `lookup`, which maps a column name
    /// to that row's finite value.
    pub fn evaluate_row<F>(&self, lookup: F) -> Option<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let inputs: Vec<Option<f64>> = self
            .inputs
            .iter()
            .map(|spec| spec.resolve_row(&lookup))
            .collect();
        self.evaluate(&inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::collections::HashMap;

    fn table(columns: &[(&str, &[&str])]) -> RawTable {
        let series: Vec<Column> = columns
            .iter()
            .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
            .collect();
        RawTable::new(DataFrame::new(series).unwrap())
    }

    #[test]
    fn test_rules_cover_geometry_and_ratios() {
        assert!(rule_for(CanonicalColumn::TransitDepth).is_some());
        assert!(rule_for(CanonicalColumn::TransitDuration).is_some());
        assert!(rule_for(CanonicalColumn::RadiusRatio).is_some());
        assert!(rule_for(CanonicalColumn::OrbitalPeriod).is_none());
    }

    #[test]
    fn test_depth_column_from_archive_names() {
        let t = table(&[("pl_rade", &["1.5", "2.0"]), ("st_rad", &["1.0", "0"])]);
        let rule = rule_for(CanonicalColumn::TransitDepth).unwrap();
        assert!(rule.is_available(&t));

        let values = rule.evaluate_column(&t).unwrap();
        assert!((values[0].unwrap() - 0.00018858155625).abs() < 1e-12);
        assert_eq!(values[1], None);
    }

    #[test]
    fn test_jupiter_radius_is_scaled() {
        let t = table(&[("pl_radj", &["1.0"]), ("stellar_radius", &["1.0"])]);
        let rule = rule_for(CanonicalColumn::TransitDepth).unwrap();
        let depth = rule.evaluate_column(&t).unwrap()[0].unwrap();
        let expected = (11.209_f64 * 0.009155).powi(2);
        assert!((depth - expected).abs() < 1e-12);
    }

    #[test]
    fn test_candidates_coalesce_per_row() {
        let t = table(&[
            ("pl_rade", &["", "2.0"]),
            ("pl_radj", &["1.0", "5.0"]),
            ("st_rad", &["1.0", "1.0"]),
        ]);
        let rule = rule_for(CanonicalColumn::RadiusRatio).unwrap();
        let values = rule.evaluate_column(&t).unwrap();
        assert!((values[0].unwrap() - 11.209).abs() < 1e-12);
        assert_eq!(values[1], Some(2.0));
    }

    #[test]
    fn test_duration_uses_semi_major_axis_when_present() {
        let t = table(&[
            ("pl_orbper", &["365.25", "365.25"]),
            ("st_rad", &["1.0", "1.0"]),
            ("pl_orbsmax", &["2.0", ""]),
        ]);
        let rule = rule_for(CanonicalColumn::TransitDuration).unwrap();
        let values = rule.evaluate_column(&t).unwrap();
        let with_axis = values[0].unwrap();
        let estimated = values[1].unwrap();
        assert!((estimated / with_axis - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unavailable_when_required_input_absent() {
        let t = table(&[("pl_rade", &["1.5"])]);
        let rule = rule_for(CanonicalColumn::TransitDepth).unwrap();
        assert!(!rule.is_available(&t));
        assert_eq!(rule.missing_inputs(&t), vec!["stellar_radius"]);
    }

    #[test]
    fn test_evaluate_row_with_lookup() {
        let values: HashMap<&str, f64> = [("orbital_period", 10.0), ("transit_duration", 0.0)]
            .into_iter()
            .collect();
        let rule = rule_for(CanonicalColumn::PeriodDurationRatio).unwrap();
        assert_eq!(rule.evaluate_row(|name| values.get(name).copied()), None);

        let values: HashMap<&str, f64> = [("orbital_period", 10.0), ("transit_duration", 2.0)]
            .into_iter()
            .collect();
        assert_eq!(rule.evaluate_row(|name| values.get(name).copied()), Some(5.0));
    }
}
