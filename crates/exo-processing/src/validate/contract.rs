//! Per-mission feature contracts.
//!
//! A contract lists, in model order, the features a mission's model consumes,
//! the canonical column each comes from, and what happens when a row has no
//! value for it.

use super::coercer::{RowView, coerce_field};
use crate::config::ReconcileConfig;
use crate::error::{MissingColumnsReport, ReconcileError, RowError};
use crate::schema::vocabulary::CanonicalColumn;
use crate::table::RawTable;
use crate::types::{FeatureVector, SchemaKind};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

use CanonicalColumn as C;
use FeaturePolicy::{Defaulted, Engineered, Required, StellarDefault};

/// Maximum number of available columns listed in a missing-columns report.
const REPORTED_COLUMNS: usize = 50;

/// What to do when a row lacks a value for a feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "policy", content = "default", rename_all = "snake_case")]
pub enum FeaturePolicy {
    /// The row fails.
    Required,
    /// A catalog-typical value is used.
    Defaulted(f64),
    /// Uses the configured stellar default.
    StellarDefault,
    /// Engineered ratio; derived from the row when possible, else the value.
    Engineered(f64),
}

/// One feature of a contract.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContractField {
    /// Name in the mission model's vocabulary.
    pub feature: &'static str,
    pub column: CanonicalColumn,
    pub policy: FeaturePolicy,
}

const fn field(feature: &'static str, column: CanonicalColumn, policy: FeaturePolicy) -> ContractField {
    ContractField {
        feature,
        column,
        policy,
    }
}

/// Feature list for one mission.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureContract {
    pub schema: SchemaKind,
    pub fields: Vec<ContractField>,
}

static KEPLER_CONTRACT: Lazy<FeatureContract> = Lazy::new(|| FeatureContract {
    schema: SchemaKind::Kepler,
    fields: vec![
        field("period", C::OrbitalPeriod, Required),
        field("duration", C::TransitDuration, Required),
        field("depth", C::TransitDepth, Required),
        field("radius", C::PlanetRadius, Defaulted(1.0)),
        field("teq", C::Teq, Defaulted(300.0)),
        field("star_radius", C::StellarRadius, Required),
        field("logg", C::Logg, Defaulted(4.5)),
        field("impact_parameter", C::ImpactParameter, Defaulted(0.0)),
        field("insolation", C::Insolation, Defaulted(1000.0)),
        field("snr", C::Snr, Defaulted(10.0)),
        field("period_duration_ratio", C::PeriodDurationRatio, Engineered(5.0)),
        field("transit_snr", C::TransitSnr, Engineered(10.0)),
        field("depth_duration_ratio", C::DepthDurationRatio, Engineered(0.001)),
        field("radius_ratio", C::RadiusRatio, Engineered(1.0)),
    ],
});

static TESS_CONTRACT: Lazy<FeatureContract> = Lazy::new(|| FeatureContract {
    schema: SchemaKind::Tess,
    fields: vec![
        field("period", C::OrbitalPeriod, Required),
        field("duration", C::TransitDuration, Required),
        field("depth", C::TransitDepth, Required),
        field("radius", C::PlanetRadius, Defaulted(1.0)),
        field("teq", C::Teq, Defaulted(300.0)),
        field("star_radius", C::StellarRadius, Required),
        field("logg", C::Logg, Defaulted(4.5)),
        field("insolation", C::Insolation, Defaulted(1000.0)),
        field("star_teff", C::StellarTemperature, StellarDefault),
        field("tess_mag", C::TessMag, Defaulted(11.0)),
        field("period_duration_ratio", C::PeriodDurationRatio, Engineered(5.0)),
        field("transit_snr", C::TransitSnr, Engineered(10.0)),
        field("depth_duration_ratio", C::DepthDurationRatio, Engineered(0.001)),
        field("radius_ratio", C::RadiusRatio, Engineered(1.0)),
    ],
});

static K2_CONTRACT: Lazy<FeatureContract> = Lazy::new(|| FeatureContract {
    schema: SchemaKind::K2,
    fields: vec![
        field("period", C::OrbitalPeriod, Required),
        field("radius", C::PlanetRadius, Defaulted(1.0)),
        field("teq", C::Teq, Defaulted(300.0)),
        field("star_radius", C::StellarRadius, Required),
        field("star_mass", C::StellarMass, StellarDefault),
        field("logg", C::Logg, Defaulted(4.5)),
        field("insolation", C::Insolation, Defaulted(1000.0)),
        field("star_teff", C::StellarTemperature, StellarDefault),
        field("v_mag", C::VMag, Defaulted(12.0)),
        field("radius_ratio", C::RadiusRatio, Engineered(1.0)),
    ],
});

/// Configured default for a stellar column.
fn stellar_default(column: CanonicalColumn, config: &ReconcileConfig) -> Option<f64> {
    match column {
        C::StellarMass => Some(config.default_stellar_mass),
        C::StellarTemperature => Some(config.default_stellar_temperature),
        _ => None,
    }
}

impl FeatureContract {
    /// Contract for `schema`; generic tables have none of their own.
    pub fn for_schema(schema: SchemaKind) -> Option<&'static FeatureContract> {
        match schema {
            SchemaKind::Kepler => Some(&*KEPLER_CONTRACT),
            SchemaKind::K2 => Some(&*K2_CONTRACT),
            SchemaKind::Tess => Some(&*TESS_CONTRACT),
            SchemaKind::Generic => None,
        }
    }

    /// Feature names in model order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.feature).collect()
    }

    /// Canonical columns a file must carry (or derive) to be processed.
    pub fn required_columns(&self) -> Vec<CanonicalColumn> {
        self.fields
            .iter()
            .filter(|f| f.policy == Required)
            .map(|f| f.column)
            .collect()
    }

    pub fn contains(&self, column: CanonicalColumn) -> bool {
        self.fields.iter().any(|f| f.column == column)
    }

    /// Required columns absent from `table`.
    pub fn missing_columns(&self, table: &RawTable) -> Vec<CanonicalColumn> {
        self.required_columns()
            .into_iter()
            .filter(|c| !table.has_column(c.name()))
            .collect()
    }

    /// Fail with a structured report when required columns are absent.
    pub fn check_columns(&self, table: &RawTable) -> Result<(), ReconcileError> {
        let missing = self.missing_columns(table);
        if missing.is_empty() {
            return Ok(());
        }
        Err(ReconcileError::MissingColumns(MissingColumnsReport {
            missing: missing.iter().map(|c| c.name().to_string()).collect(),
            available_columns: table
                .column_names()
                .into_iter()
                .take(REPORTED_COLUMNS)
                .collect(),
            model_type: self.schema.as_str().to_string(),
            required_columns: self
                .required_columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        }))
    }

    /// Coerce row `index` of `table` into a feature vector.
    ///
    /// Contract fields are resolved in order, so engineered ratios see the
    /// geometry resolved before them. Core fields outside the contract are
    /// filled on a best-effort basis and never fail the row.
    pub fn feature_vector(
        &self,
        table: &RawTable,
        index: usize,
        config: &ReconcileConfig,
    ) -> Result<FeatureVector, RowError> {
        let mut row = RowView::new(table, index);
        let mut model_features = BTreeMap::new();

        for f in &self.fields {
            let default = match f.policy {
                Required => None,
                Defaulted(v) | Engineered(v) => Some(v),
                StellarDefault => stellar_default(f.column, config),
            };
            let value = coerce_field(&row, f.column, default)?;
            row.record(f.column, value);
            model_features.insert(f.feature.to_string(), value);
        }

        let optional = |column: CanonicalColumn| -> Option<f64> {
            row.resolved(column)
                .or_else(|| coerce_field(&row, column, stellar_default(column, config)).ok())
        };

        let orbital_period = optional(C::OrbitalPeriod);
        let stellar_radius = optional(C::StellarRadius);
        let (Some(orbital_period), Some(stellar_radius)) = (orbital_period, stellar_radius) else {
            // Every contract requires both, so this only triggers for malformed contracts.
            return Err(RowError::MissingValue {
                field: if orbital_period.is_none() {
                    C::OrbitalPeriod.name().to_string()
                } else {
                    C::StellarRadius.name().to_string()
                },
                row_sample: row.snapshot(),
            });
        };

        Ok(FeatureVector {
            schema: self.schema,
            orbital_period,
            transit_duration: optional(C::TransitDuration),
            transit_depth: optional(C::TransitDepth),
            stellar_radius,
            stellar_mass: optional(C::StellarMass).unwrap_or(config.default_stellar_mass),
            stellar_temperature: optional(C::StellarTemperature)
                .unwrap_or(config.default_stellar_temperature),
            model_features,
        })
    }
}
