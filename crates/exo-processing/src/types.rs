//! Shared data types for reconciliation results.

use crate::error::{ReconcileError, RowError};
use crate::predict::Prediction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Catalog schema a file was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Kepler cumulative KOI table.
    Kepler,
    /// K2 planets-and-candidates table.
    K2,
    /// TESS objects of interest table.
    Tess,
    /// No known schema matched.
    Generic,
}

impl SchemaKind {
    /// The three schemas with dedicated alias tables and feature contracts.
    pub const KNOWN: [SchemaKind; 3] = [SchemaKind::Kepler, SchemaKind::K2, SchemaKind::Tess];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kepler => "kepler",
            Self::K2 => "k2",
            Self::Tess => "tess",
            Self::Generic => "generic",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Generic)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kepler" | "koi" => Ok(Self::Kepler),
            "k2" => Ok(Self::K2),
            "tess" | "toi" => Ok(Self::Tess),
            "generic" | "unknown" => Ok(Self::Generic),
            other => Err(ReconcileError::UnknownSchema(other.to_string())),
        }
    }
}

/// How the schema used for a file was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    /// Inferred from column names.
    Detected,
    /// Supplied by the caller.
    Hint,
}

/// Per-row canonical features handed to the prediction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Schema whose feature contract produced this vector.
    pub schema: SchemaKind,
    /// Days.
    pub orbital_period: f64,
    /// Hours. Absent for schemas whose contract does not use it.
    pub transit_duration: Option<f64>,
    /// Fraction of stellar flux. Absent for schemas whose contract does not use it.
    pub transit_depth: Option<f64>,
    /// Solar radii.
    pub stellar_radius: f64,
    /// Solar masses.
    pub stellar_mass: f64,
    /// Kelvin.
    pub stellar_temperature: f64,
    /// Features keyed by the mission model's vocabulary.
    pub model_features: BTreeMap<String, f64>,
}

impl FeatureVector {
    /// Look up a model feature by name.
    pub fn model_feature(&self, name: &str) -> Option<f64> {
        self.model_features.get(name).copied()
    }
}

/// How a source column came to carry a canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameVia {
    /// Only the letter case differed from the canonical name.
    Case,
    /// Exact match in the schema's alias list.
    Alias,
    /// Substring keyword match.
    Keyword,
}

/// One rename performed by the column mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub source: String,
    pub canonical: String,
    pub via: RenameVia,
}

/// Which CSV parsing strategy produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// Comma separated, strict.
    Standard,
    /// Sniffed separator with ragged lines tolerated.
    Permissive,
    /// Permissive parsing over pre-cleaned content.
    Cleaned,
}

/// Everything learned about a file before any row is coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub encoding: String,
    pub decode_errors: bool,
    pub start_line_index: usize,
    pub header_line_index: usize,
    pub header_line_preview: String,
    pub parse_strategy: ParseStrategy,
    pub original_columns: Vec<String>,
    pub detected_schema: SchemaKind,
    pub schema_source: SchemaSource,
    /// Schema whose feature contract applies; differs from
    /// `detected_schema` only when a generic table was defaulted.
    pub effective_schema: SchemaKind,
    pub defaulted_schema: bool,
    pub rename_map: Vec<ColumnRename>,
    pub depth_converted_from_ppm: bool,
    pub derived_columns: Vec<String>,
    pub final_columns: Vec<String>,
    pub row_count: usize,
}

/// Debug view of a reconciled file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewReport {
    pub diagnostics: Diagnostics,
    pub sample_rows: Vec<Map<String, Value>>,
}

/// Prediction attached to the model that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub model: String,
    pub used_fallback: bool,
    pub interpretation: String,
}

/// Analysis of a single row.
#[derive(Debug, Clone, Serialize)]
pub struct RowAnalysis {
    pub row: usize,
    pub features: FeatureVector,
    pub prediction: PredictionOutcome,
    pub diagnostics: Diagnostics,
}

/// Result of one row within a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Predicted {
        row: usize,
        input: FeatureVector,
        prediction: PredictionOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        disposition: Option<String>,
    },
    Failed {
        row: usize,
        error: RowError,
    },
}

impl RowOutcome {
    pub fn row(&self) -> usize {
        match self {
            Self::Predicted { row, .. } | Self::Failed { row, .. } => *row,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Predicted { .. })
    }
}

/// Tally of normalized catalog dispositions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionCounts {
    pub confirmed: usize,
    pub candidate: usize,
    pub false_positive: usize,
    pub unrecognized: usize,
}

/// Aggregate numbers for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub predicted: usize,
    pub failed: usize,
    /// Name of the catalog disposition column, when one exists.
    pub disposition_column: Option<String>,
    pub dispositions: DispositionCounts,
    /// Predicted rows whose disposition maps to a prediction label.
    pub labelled: usize,
    /// Labelled rows whose prediction agrees with the disposition.
    pub agreements: usize,
    pub accuracy: Option<f64>,
}

/// Full result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub summary: BatchSummary,
    pub diagnostics: Diagnostics,
    pub results: Vec<RowOutcome>,
}
