//! The `Pipeline` entry points and their builder.

use super::reconcile::{Reconciliation, reconcile};
use crate::config::ReconcileConfig;
use crate::disposition::{self, Disposition};
use crate::error::{ReconcileError, Result};
use crate::predict::ModelRegistry;
use crate::table::Cell;
use crate::types::{
    BatchReport, BatchSummary, PreviewReport, RowAnalysis, RowOutcome, SchemaKind,
};
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};

/// Rows included in a preview.
pub const PREVIEW_ROWS: usize = 5;

/// Reconciles catalog files and classifies their rows.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use exo_processing::{Pipeline, ReconcileConfig, SchemaKind};
/// use exo_processing::predict::ModelRegistry;
/// use std::sync::Arc;
///
/// let pipeline = Pipeline::builder()
///     .config(ReconcileConfig::builder().strict_schema(true).build()?)
///     .registry(Arc::new(ModelRegistry::load_dir("models")?))
///     .build()?;
///
/// let report = pipeline.process_batch(&bytes, Some(SchemaKind::Tess))?;
/// println!("{} of {} rows predicted", report.summary.predicted, report.summary.total_rows);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: ReconcileConfig,
    registry: Arc<ModelRegistry>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Reconcile a file without predicting.
    ///
    /// `hint` overrides schema detection.
    pub fn reconcile(&self, bytes: &[u8], hint: Option<SchemaKind>) -> Result<Reconciliation> {
        reconcile(bytes, hint, &self.config)
    }

    /// Analyse the first data row only.
    ///
    /// # Errors
    ///
    /// Structural failures as for [`reconcile`](Self::reconcile), and
    /// [`ReconcileError::Row`] when the first row cannot be coerced.
    pub fn process_single(&self, bytes: &[u8], hint: Option<SchemaKind>) -> Result<RowAnalysis> {
        let rec = self.reconcile(bytes, hint)?;

        info!("Step 5: Predicting first row...");
        let features = rec
            .feature_vector(0)
            .map_err(|source| ReconcileError::Row { row: 0, source })?;
        let prediction = self.registry.predict_with_fallback(&features)?;

        let (_, diagnostics) = rec.into_parts();
        Ok(RowAnalysis {
            row: 0,
            features,
            prediction,
            diagnostics,
        })
    }

    /// Analyse every row. Rows that fail coercion are reported, not fatal.
    pub fn process_batch(&self, bytes: &[u8], hint: Option<SchemaKind>) -> Result<BatchReport> {
        let rec = self.reconcile(bytes, hint)?;
        let effective = rec.diagnostics().effective_schema;
        let total_rows = rec.row_count();

        info!("Step 5: Predicting {} rows...", total_rows);
        if !self.registry.has_model(effective) {
            warn!(
                "No trained model for {}; predictions use {}",
                effective,
                self.registry.fallback().name()
            );
        }

        let column_names = rec.table().column_names();
        let disposition_column = disposition::find_disposition_column(&column_names).map(str::to_string);
        let mut summary = BatchSummary {
            total_rows,
            disposition_column: disposition_column.clone(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(total_rows);

        for row in 0..total_rows {
            let truth = disposition_column
                .as_deref()
                .map(|column| disposition::normalize(&cell_text(rec.table().cell(row, column))))
                .filter(|d| *d != Disposition::Unrecognized(String::new()));
            if let Some(d) = &truth {
                tally(&mut summary, d);
            }

            match rec.feature_vector(row) {
                Ok(input) => {
                    let prediction = self.registry.predict_with_fallback(&input)?;
                    summary.predicted += 1;
                    if let Some(expected) = truth.as_ref().and_then(Disposition::prediction_label) {
                        summary.labelled += 1;
                        if expected == prediction.prediction.label {
                            summary.agreements += 1;
                        }
                    }
                    results.push(RowOutcome::Predicted {
                        row,
                        input,
                        prediction,
                        disposition: truth.map(|d| d.as_str().to_string()),
                    });
                }
                Err(error) => {
                    warn!("Row {} skipped: {}", row, error);
                    summary.failed += 1;
                    results.push(RowOutcome::Failed { row, error });
                }
            }
        }

        if summary.labelled > 0 {
            summary.accuracy = Some(summary.agreements as f64 / summary.labelled as f64);
        }
        info!(
            "Batch complete: {} predicted, {} failed",
            summary.predicted, summary.failed
        );

        let (_, diagnostics) = rec.into_parts();
        Ok(BatchReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            summary,
            diagnostics,
            results,
        })
    }

    /// Diagnostics and the first rows of the reconciled table.
    pub fn preview(&self, bytes: &[u8], hint: Option<SchemaKind>) -> Result<PreviewReport> {
        let rec = self.reconcile(bytes, hint)?;
        let sample_rows = rec.sample_rows(PREVIEW_ROWS);
        let (_, diagnostics) = rec.into_parts();
        Ok(PreviewReport {
            diagnostics,
            sample_rows,
        })
    }
}

fn cell_text(cell: Cell) -> String {
    match cell {
        Cell::Text(s) => s,
        Cell::Number(v) => v.to_string(),
        Cell::Empty => String::new(),
    }
}

fn tally(summary: &mut BatchSummary, disposition: &Disposition) {
    let counts = &mut summary.dispositions;
    match disposition {
        Disposition::Confirmed => counts.confirmed += 1,
        Disposition::Candidate => counts.candidate += 1,
        Disposition::FalsePositive => counts.false_positive += 1,
        Disposition::Unrecognized(_) => counts.unrecognized += 1,
    }
}

/// Builder for a [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<ReconcileConfig>,
    registry: Option<Arc<ModelRegistry>>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: ReconcileConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a model registry. Without one, every prediction uses the
    /// rule-based classifier.
    pub fn registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Pipeline {
            config,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(ModelRegistry::rule_based())),
        })
    }
}
