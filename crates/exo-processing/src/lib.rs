//! Exoplanet Catalog Reconciliation Library
//!
//! Turns transit-survey CSV exports (Kepler KOI, K2 planets-and-candidates,
//! TESS TOI, or ad-hoc tables) into per-row feature vectors with canonical
//! names and units, and hands them to a classifier.
//!
//! # Overview
//!
//! - **Ingestion**: byte decoding with fallbacks, comment skipping, header
//!   location, and CSV parsing that degrades gracefully on ragged rows
//! - **Schema Detection**: ordered classification rules over column names
//! - **Column Mapping**: per-mission aliases, substring keywords and a
//!   central denylist, with ppm depths converted to fractions exactly once
//! - **Feature Synthesis**: transit depth and duration from physics, plus
//!   the engineered ratios the mission models consume
//! - **Validation**: per-mission feature contracts with structured row errors
//! - **Prediction**: per-mission models with a rule-based fallback
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use exo_processing::{Pipeline, SchemaKind};
//!
//! let bytes = std::fs::read("cumulative.csv")?;
//! let pipeline = Pipeline::builder().build()?;
//!
//! // Every row; bad rows are reported, not fatal
//! let report = pipeline.process_batch(&bytes, None)?;
//! println!("{} predicted, {} failed", report.summary.predicted, report.summary.failed);
//!
//! // What the reconciler saw, without predicting
//! let preview = pipeline.preview(&bytes, Some(SchemaKind::Kepler))?;
//! println!("{:?}", preview.diagnostics.rename_map);
//! ```
//!
//! # Errors
//!
//! Structural problems (unparseable file, missing required columns) stop
//! the whole file with a [`ReconcileError`]. Problems confined to one row
//! are reported as a [`RowError`] for that row.

pub mod config;
pub mod derive;
pub mod disposition;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod predict;
pub mod schema;
pub mod table;
pub mod template;
pub mod types;
pub mod utils;
pub mod validate;

// Re-exports for convenient access
pub use config::{ConfigValidationError, ReconcileConfig, ReconcileConfigBuilder};
pub use derive::FeatureSynthesizer;
pub use disposition::Disposition;
pub use error::{
    MissingColumnsReport, ModelError, ReconcileError, Result as ReconcileResult, ResultExt,
    RowError,
};
pub use pipeline::{Pipeline, PipelineBuilder, Reconciliation};
pub use predict::{
    Classifier, LinearClassifier, ModelRegistry, Prediction, PredictionLabel,
    ProbabilityDistribution, RuleBasedClassifier,
};
pub use schema::{CanonicalColumn, ColumnMapper, classify};
pub use table::{Cell, RawTable};
pub use types::{
    BatchReport, BatchSummary, ColumnRename, Diagnostics, DispositionCounts, FeatureVector,
    ParseStrategy, PredictionOutcome, PreviewReport, RenameVia, RowAnalysis, RowOutcome,
    SchemaKind, SchemaSource,
};
pub use validate::{FeatureContract, FeaturePolicy};
