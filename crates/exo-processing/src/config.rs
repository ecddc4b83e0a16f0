//! Configuration for catalog reconciliation.
//!
//! Use [`ReconcileConfig::builder()`] for a validated configuration with
//! selective overrides; [`ReconcileConfig::default()`] carries the values
//! the catalogs are normally processed with.

use crate::types::SchemaKind;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// Configuration for the reconciliation pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use exo_processing::{ReconcileConfig, SchemaKind};
///
/// let config = ReconcileConfig::builder()
///     .header_search_window(50)
///     .generic_fallback(SchemaKind::Tess)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Number of lines after the first content line searched for a header.
    pub header_search_window: usize,

    /// Line prefixes that mark comment lines.
    pub comment_markers: Vec<String>,

    /// Transit depths above this value are read as ppm and scaled to a fraction.
    pub depth_ppm_threshold: f64,

    /// Stellar mass (solar masses) used when a row has none.
    pub default_stellar_mass: f64,

    /// Stellar effective temperature (K) used when a row has none.
    pub default_stellar_temperature: f64,

    /// Contract applied to tables no known schema matched.
    pub generic_fallback: SchemaKind,

    /// Refuse generic tables instead of defaulting them.
    pub strict_schema: bool,

    /// Encoding label tried when the input is not valid UTF-8 (e.g. "latin1").
    pub fallback_encoding: Option<String>,

    /// Upper bound on data rows accepted from one file.
    pub max_rows: Option<usize>,
}

static_assertions::assert_impl_all!(ReconcileConfig: Send, Sync);

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            header_search_window: 200,
            comment_markers: vec!["#".to_string()],
            depth_ppm_threshold: 1.0,
            default_stellar_mass: 1.0,
            default_stellar_temperature: 5778.0,
            generic_fallback: SchemaKind::Kepler,
            strict_schema: false,
            fallback_encoding: None,
            max_rows: None,
        }
    }
}

impl ReconcileConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ReconcileConfigBuilder {
        ReconcileConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.header_search_window == 0 {
            return Err(ConfigValidationError::InvalidHeaderWindow);
        }

        if self.comment_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyCommentMarker);
        }

        for (field, value) in [
            ("depth_ppm_threshold", self.depth_ppm_threshold),
            ("default_stellar_mass", self.default_stellar_mass),
            ("default_stellar_temperature", self.default_stellar_temperature),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::NotPositive {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.generic_fallback.is_known() {
            return Err(ConfigValidationError::GenericFallback);
        }

        if let Some(label) = &self.fallback_encoding
            && Encoding::for_label(label.as_bytes()).is_none()
        {
            return Err(ConfigValidationError::UnknownEncoding(label.clone()));
        }

        if self.max_rows == Some(0) {
            return Err(ConfigValidationError::InvalidMaxRows);
        }

        Ok(())
    }

    /// Resolved fallback encoding, if one is configured.
    pub fn fallback_encoding(&self) -> Option<&'static Encoding> {
        self.fallback_encoding
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Header search window must be at least 1 line")]
    InvalidHeaderWindow,

    #[error("Comment markers must not be empty")]
    EmptyCommentMarker,

    #[error("Invalid value for '{field}': {value} (must be a positive number)")]
    NotPositive { field: String, value: f64 },

    #[error("Generic fallback must be kepler, k2 or tess")]
    GenericFallback,

    #[error("Unknown encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("Row limit must be at least 1")]
    InvalidMaxRows,
}

impl From<ConfigValidationError> for crate::error::ReconcileError {
    fn from(e: ConfigValidationError) -> Self {
        crate::error::ReconcileError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`ReconcileConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ReconcileConfigBuilder {
    header_search_window: Option<usize>,
    comment_markers: Option<Vec<String>>,
    depth_ppm_threshold: Option<f64>,
    default_stellar_mass: Option<f64>,
    default_stellar_temperature: Option<f64>,
    generic_fallback: Option<SchemaKind>,
    strict_schema: Option<bool>,
    fallback_encoding: Option<String>,
    max_rows: Option<usize>,
}

impl ReconcileConfigBuilder {
    /// Set how many lines are scanned for the header row.
    pub fn header_search_window(mut self, lines: usize) -> Self {
        self.header_search_window = Some(lines);
        self
    }

    /// Replace the comment markers (default `#`).
    pub fn comment_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    pub fn depth_ppm_threshold(mut self, threshold: f64) -> Self {
        self.depth_ppm_threshold = Some(threshold);
        self
    }

    pub fn default_stellar_mass(mut self, mass: f64) -> Self {
        self.default_stellar_mass = Some(mass);
        self
    }

    pub fn default_stellar_temperature(mut self, kelvin: f64) -> Self {
        self.default_stellar_temperature = Some(kelvin);
        self
    }

    /// Set the contract used when a table matches no known schema.
    pub fn generic_fallback(mut self, schema: SchemaKind) -> Self {
        self.generic_fallback = Some(schema);
        self
    }

    /// When enabled, generic tables are rejected instead of defaulted.
    pub fn strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = Some(strict);
        self
    }

    pub fn fallback_encoding(mut self, label: impl Into<String>) -> Self {
        self.fallback_encoding = Some(label.into());
        self
    }

    pub fn max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ReconcileConfig` or an error if validation fails.
    pub fn build(self) -> Result<ReconcileConfig, ConfigValidationError> {
        let defaults = ReconcileConfig::default();
        let config = ReconcileConfig {
            header_search_window: self
                .header_search_window
                .unwrap_or(defaults.header_search_window),
            comment_markers: self.comment_markers.unwrap_or(defaults.comment_markers),
            depth_ppm_threshold: self
                .depth_ppm_threshold
                .unwrap_or(defaults.depth_ppm_threshold),
            default_stellar_mass: self
                .default_stellar_mass
                .unwrap_or(defaults.default_stellar_mass),
            default_stellar_temperature: self
                .default_stellar_temperature
                .unwrap_or(defaults.default_stellar_temperature),
            generic_fallback: self.generic_fallback.unwrap_or(defaults.generic_fallback),
            strict_schema: self.strict_schema.unwrap_or(defaults.strict_schema),
            fallback_encoding: self.fallback_encoding,
            max_rows: self.max_rows,
        };

        config.validate()?;
        Ok(config)
    }
}
