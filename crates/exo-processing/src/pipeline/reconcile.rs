//! The reconciliation stages shared by every pipeline entry point.

use crate::config::ReconcileConfig;
use crate::derive::FeatureSynthesizer;
use crate::error::{ReconcileError, Result, RowError};
use crate::ingest::load_table;
use crate::schema::{ColumnMapper, classify};
use crate::table::RawTable;
use crate::types::{Diagnostics, FeatureVector, SchemaKind, SchemaSource};
use crate::validate::FeatureContract;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// A table mapped onto the canonical vocabulary, ready for row coercion.
#[derive(Debug)]
pub struct Reconciliation {
    table: RawTable,
    diagnostics: Diagnostics,
    contract: &'static FeatureContract,
    config: ReconcileConfig,
}

impl Reconciliation {
    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn contract(&self) -> &'static FeatureContract {
        self.contract
    }

    pub fn row_count(&self) -> usize {
        self.table.height()
    }

    /// Coerce one row into a feature vector.
    pub fn feature_vector(&self, row: usize) -> std::result::Result<FeatureVector, RowError> {
        self.contract.feature_vector(&self.table, row, &self.config)
    }

    /// Feature vectors for every row, in row order.
    pub fn feature_vectors(&self) -> Vec<std::result::Result<FeatureVector, RowError>> {
        (0..self.row_count()).map(|row| self.feature_vector(row)).collect()
    }

    /// JSON-safe copies of the first `n` rows.
    pub fn sample_rows(&self, n: usize) -> Vec<Map<String, Value>> {
        (0..self.row_count().min(n))
            .map(|row| self.table.row_snapshot(row))
            .collect()
    }

    pub fn into_parts(self) -> (RawTable, Diagnostics) {
        (self.table, self.diagnostics)
    }
}

/// Pick the schema whose contract applies.
///
/// Returns `(effective, defaulted)`.
fn resolve_schema(
    detected: SchemaKind,
    columns: &[String],
    config: &ReconcileConfig,
) -> Result<(SchemaKind, bool)> {
    if detected.is_known() {
        return Ok((detected, false));
    }
    if config.strict_schema {
        return Err(ReconcileError::SchemaUndetermined {
            columns: columns.to_vec(),
        });
    }
    warn!(
        "Could not identify catalog schema; applying the {} contract",
        config.generic_fallback
    );
    Ok((config.generic_fallback, true))
}

/// Run ingestion, schema resolution, mapping, derivation and the contract
/// column check.
pub(crate) fn reconcile(
    bytes: &[u8],
    hint: Option<SchemaKind>,
    config: &ReconcileConfig,
) -> Result<Reconciliation> {
    info!("Step 1: Loading table...");
    let (mut table, ingest) = load_table(bytes, config)?;

    info!("Step 2: Resolving schema...");
    let (detected, schema_source) = match hint {
        Some(schema) => (schema, SchemaSource::Hint),
        None => (classify(&ingest.original_columns), SchemaSource::Detected),
    };
    let (effective, defaulted) = resolve_schema(detected, &ingest.original_columns, config)?;
    info!(
        "Schema: {} ({:?}), contract: {}",
        detected, schema_source, effective
    );

    info!("Step 3: Mapping columns...");
    let mapping = ColumnMapper::new(config.depth_ppm_threshold).map(&mut table, detected)?;
    for rename in &mapping.renames {
        debug!("  {} -> {} ({:?})", rename.source, rename.canonical, rename.via);
    }

    info!("Step 4: Deriving features...");
    let derived = FeatureSynthesizer.synthesize(&mut table)?;

    let contract = FeatureContract::for_schema(effective).ok_or_else(|| {
        ReconcileError::InvalidConfig(format!("no feature contract for {} schema", effective))
    })?;
    contract.check_columns(&table)?;

    let diagnostics = Diagnostics {
        encoding: ingest.encoding,
        decode_errors: ingest.decode_errors,
        start_line_index: ingest.start_line_index,
        header_line_index: ingest.header_line_index,
        header_line_preview: ingest.header_line_preview,
        parse_strategy: ingest.parse_strategy,
        original_columns: ingest.original_columns,
        detected_schema: detected,
        schema_source,
        effective_schema: effective,
        defaulted_schema: defaulted,
        rename_map: mapping.renames,
        depth_converted_from_ppm: mapping.depth_converted,
        derived_columns: derived.iter().map(|c| c.name().to_string()).collect(),
        final_columns: table.column_names(),
        row_count: table.height(),
    };

    Ok(Reconciliation {
        table,
        diagnostics,
        contract,
        config: config.clone(),
    })
}
