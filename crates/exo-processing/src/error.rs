//! Error types for catalog reconciliation.
//!
//! Two tiers are kept apart: [`ReconcileError`] covers structural failures
//! that stop a whole file, while [`RowError`] describes a single row that
//! could not be turned into a feature vector. Batch processing records row
//! errors and keeps going; single-row processing wraps them in
//! [`ReconcileError::Row`].
//!
//! Both serialize to machine-readable JSON so callers can surface them
//! without string parsing.

use serde::Serialize;
use serde::ser::SerializeStruct;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured detail for a file whose columns cannot satisfy a mission's
/// feature contract, even after aliasing and derivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingColumnsReport {
    /// Canonical columns that are required but absent.
    pub missing: Vec<String>,
    /// Column names present in the table (first 50).
    pub available_columns: Vec<String>,
    /// Schema whose contract was checked.
    pub model_type: String,
    /// Every canonical column the contract requires.
    pub required_columns: Vec<String>,
}

/// Failure to coerce a single row into a feature vector.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RowError {
    /// Required field is empty and could not be derived or defaulted.
    #[error("Missing value for '{field}'")]
    MissingValue {
        field: String,
        row_sample: Map<String, Value>,
    },

    /// Field holds text that does not parse as a finite number.
    #[error("Invalid number for '{field}': {value}")]
    InvalidNumber {
        field: String,
        value: Value,
        row_sample: Map<String, Value>,
    },
}

impl RowError {
    /// Canonical field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingValue { field, .. } | Self::InvalidNumber { field, .. } => field,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingValue { .. } => "MISSING_VALUE",
            Self::InvalidNumber { .. } => "INVALID_NUMBER",
        }
    }
}

/// Failures of a prediction collaborator.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model expects a feature the vector does not carry.
    #[error("Feature '{0}' required by the model is missing")]
    MissingFeature(String),

    /// Model artifact is internally inconsistent.
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// Model produced a class label outside the prediction vocabulary.
    #[error("Unknown class label '{0}'")]
    UnknownLabel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The main error type for reconciliation.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Every CSV parsing strategy failed.
    #[error("Failed to parse CSV: {0}")]
    ParseFailure(String),

    /// The file parsed but holds no data rows.
    #[error("CSV contains no data rows")]
    EmptyTable,

    /// The file exceeds the configured row ceiling.
    #[error("CSV has {rows} rows, exceeding the limit of {limit}")]
    TooManyRows { rows: usize, limit: usize },

    /// Strict mode refused to default an unrecognized schema.
    #[error("Could not determine catalog schema from columns: {}", .columns.join(", "))]
    SchemaUndetermined { columns: Vec<String> },

    /// Required canonical columns are absent after mapping and derivation.
    #[error("Missing required columns for {}: {}", .0.model_type, .0.missing.join(", "))]
    MissingColumns(MissingColumnsReport),

    /// A row failed coercion in single-row mode.
    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: RowError,
    },

    /// Mission name not recognized.
    #[error("Unknown schema '{0}' (expected kepler, k2, tess or generic)")]
    UnknownSchema(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Prediction collaborator failure that could not be recovered.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReconcileError>,
    },
}

impl ReconcileError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReconcileError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ParseFailure(_) => "PARSE_FAILURE",
            Self::EmptyTable => "EMPTY_TABLE",
            Self::TooManyRows { .. } => "TOO_MANY_ROWS",
            Self::SchemaUndetermined { .. } => "SCHEMA_UNDETERMINED",
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::Row { source, .. } => source.error_code(),
            Self::UnknownSchema(_) => "UNKNOWN_SCHEMA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Model(_) => "MODEL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Structured payload for errors that carry one.
    pub fn detail(&self) -> Option<Value> {
        match self {
            Self::MissingColumns(report) => {
                let mut value = serde_json::to_value(report).ok()?;
                if let Value::Object(map) = &mut value {
                    map.insert("error".to_string(), Value::from("missing_columns"));
                }
                Some(value)
            }
            Self::Row { source, .. } => serde_json::to_value(source).ok(),
            Self::WithContext { source, .. } => source.detail(),
            _ => None,
        }
    }

    /// True when the failure concerns the uploaded data rather than the
    /// environment, so the caller should report it back to the user.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::ParseFailure(_)
            | Self::EmptyTable
            | Self::TooManyRows { .. }
            | Self::SchemaUndetermined { .. }
            | Self::MissingColumns(_)
            | Self::Row { .. } => true,
            Self::WithContext { source, .. } => source.is_data_error(),
            _ => false,
        }
    }
}

/// Errors serialize as `{code, message, detail?}`.
impl Serialize for ReconcileError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let detail = self.detail();
        let len = if detail.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("ReconcileError", len)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        if let Some(detail) = detail {
            state.serialize_field("detail", &detail)?;
        }
        state.end()
    }
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReconcileError::Polars(e).with_context(context))
    }
}
