//! Integration tests for catalog reconciliation.
//!
//! These tests run archive-shaped files through the public pipeline API.

use exo_processing::disposition::{self, Disposition};
use exo_processing::predict::{LinearModelArtifact, ModelRegistry};
use exo_processing::{
    Pipeline, PredictionLabel, ReconcileConfig, ReconcileError, RowError, RowOutcome, SchemaKind,
    SchemaSource, template,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> Vec<u8> {
    fs::read(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn pipeline() -> Pipeline {
    Pipeline::builder().build().expect("Default pipeline should build")
}

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {} within {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// Fresh directory under the system temp dir, unique per test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("exo-processing-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Depth-only softmax model: deep transits read as planets, shallow ones
/// as false positives.
fn depth_model() -> LinearModelArtifact {
    LinearModelArtifact {
        name: Some("kepler-depth".to_string()),
        features: vec!["depth".to_string()],
        mean: vec![0.005],
        scale: vec![0.001],
        classes: vec![
            "CONFIRMED".to_string(),
            "CANDIDATE".to_string(),
            "FALSE POSITIVE".to_string(),
        ],
        coefficients: vec![vec![10.0], vec![0.0], vec![-10.0]],
        intercepts: vec![0.0, 0.0, 0.0],
    }
}

// ============================================================================
// End-to-End Scenarios
// ============================================================================

#[test]
fn test_kepler_minimal_file() {
    let csv = b"koi_period,koi_duration,koi_depth,koi_srad\n12.3,2.5,1500,0.95\n";
    let analysis = pipeline().process_single(csv, None).unwrap();

    assert_eq!(analysis.diagnostics.detected_schema, SchemaKind::Kepler);
    assert!(analysis.diagnostics.depth_converted_from_ppm);

    // The reported duration is used as is, never re-derived.
    let renamed: Vec<&str> = analysis
        .diagnostics
        .rename_map
        .iter()
        .map(|r| r.source.as_str())
        .collect();
    assert_eq!(
        renamed,
        vec!["koi_period", "koi_duration", "koi_depth", "koi_srad"]
    );
    assert!(
        !analysis
            .diagnostics
            .derived_columns
            .contains(&"transit_duration".to_string())
    );

    let v = &analysis.features;
    assert_eq!(v.orbital_period, 12.3);
    assert_eq!(v.transit_duration, Some(2.5));
    assert_eq!(v.transit_depth, Some(0.0015));
    assert_eq!(v.stellar_radius, 0.95);
    assert_eq!(v.stellar_mass, 1.0);
    assert_eq!(v.stellar_temperature, 5778.0);

    // Shallow transit: the stand-in calls it a false positive.
    assert_eq!(
        analysis.prediction.prediction.label,
        PredictionLabel::FalsePositive
    );
    assert_eq!(analysis.prediction.prediction.confidence, 0.80);
    assert!(analysis.prediction.used_fallback);
}

#[test]
fn test_generic_radii_derive_geometry() {
    let bytes = load_fixture("generic_radii.csv");
    let analysis = pipeline().process_single(&bytes, None).unwrap();
    let d = &analysis.diagnostics;

    assert_eq!(d.detected_schema, SchemaKind::Generic);
    assert_eq!(d.effective_schema, SchemaKind::Kepler);
    assert!(d.defaulted_schema);
    assert!(d.derived_columns.contains(&"transit_depth".to_string()));
    assert!(d.derived_columns.contains(&"transit_duration".to_string()));

    // The planet radius column must not be taken for the stellar radius.
    let stellar = d
        .rename_map
        .iter()
        .find(|r| r.canonical == "stellar_radius")
        .unwrap();
    assert_eq!(stellar.source, "st_rad");

    let v = &analysis.features;
    assert_eq!(v.orbital_period, 10.0);
    assert_eq!(v.stellar_radius, 1.0);
    assert_close(v.transit_depth.unwrap(), 0.000_188_581_556_25, 1e-12);
    // a = (10 / 365.25)^(2/3) AU
    assert_close(v.transit_duration.unwrap(), 3.911, 1e-3);
}

#[test]
fn test_generic_temperature_column_is_not_the_period() {
    let csv = b"star_temperature,pl_orbper,pl_trandurh,pl_trandep,st_rad\n5778,10.0,3.0,0.002,1.0\n";
    let analysis = pipeline().process_single(csv, None).unwrap();

    assert_eq!(analysis.diagnostics.detected_schema, SchemaKind::Generic);
    assert!(
        analysis
            .diagnostics
            .rename_map
            .iter()
            .all(|r| r.source != "star_temperature")
    );
    assert_eq!(analysis.features.orbital_period, 10.0);
    assert_eq!(analysis.features.transit_duration, Some(3.0));
}

#[test]
fn test_disposition_codes() {
    assert_eq!(disposition::normalize("KP"), Disposition::Confirmed);
    assert_eq!(disposition::normalize("KP").as_str(), "CONFIRMED");
    assert_eq!(
        disposition::normalize("APC"),
        Disposition::Unrecognized("APC".to_string())
    );
    assert_eq!(disposition::normalize("APC").as_str(), "APC");
}

// ============================================================================
// Mission Files
// ============================================================================

#[test]
fn test_kepler_export_with_comment_block() {
    let bytes = load_fixture("kepler_cumulative.csv");
    let report = pipeline().process_batch(&bytes, None).unwrap();
    let d = &report.diagnostics;

    assert_eq!(d.detected_schema, SchemaKind::Kepler);
    assert_eq!(d.schema_source, SchemaSource::Detected);
    assert_eq!(d.start_line_index, 7);
    assert_eq!(d.header_line_index, 7);
    assert!(d.header_line_preview.starts_with("kepid,kepoi_name"));
    assert_eq!(d.row_count, 4);

    // Uncertainty columns are never aliased.
    assert!(d.rename_map.iter().all(|r| r.source != "koi_period_err1"));
    assert!(d.final_columns.contains(&"koi_period_err1".to_string()));

    assert_eq!(report.summary.predicted, 4);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.dispositions.confirmed, 2);
    assert_eq!(report.summary.dispositions.candidate, 1);
    assert_eq!(report.summary.dispositions.false_positive, 1);

    let RowOutcome::Predicted { input, .. } = &report.results[1] else {
        panic!("row 1 should be predicted");
    };
    assert_close(input.transit_depth.unwrap(), 0.010829, 1e-12);
    assert_eq!(input.model_feature("snr"), Some(76.3));
    assert_eq!(input.model_feature("impact_parameter"), Some(0.586));
}

#[test]
fn test_tess_export() {
    let bytes = load_fixture("tess_toi.csv");
    let report = pipeline().process_batch(&bytes, None).unwrap();

    assert_eq!(report.diagnostics.detected_schema, SchemaKind::Tess);
    assert_eq!(
        report.summary.disposition_column.as_deref(),
        Some("tfopwg_disp")
    );
    assert_eq!(report.summary.predicted, 4);

    let counts = &report.summary.dispositions;
    assert_eq!(counts.confirmed, 1);
    assert_eq!(counts.candidate, 1);
    assert_eq!(counts.false_positive, 1);
    assert_eq!(counts.unrecognized, 1);

    // APC is reported as written and left out of the agreement count.
    let RowOutcome::Predicted { disposition, .. } = &report.results[3] else {
        panic!("row 3 should be predicted");
    };
    assert_eq!(disposition.as_deref(), Some("APC"));
    assert_eq!(report.summary.labelled, 3);

    let RowOutcome::Predicted { input, .. } = &report.results[2] else {
        panic!("row 2 should be predicted");
    };
    assert_close(input.transit_depth.unwrap(), 0.0139, 1e-12);
    assert_eq!(input.model_feature("tess_mag"), Some(6.86));
}

#[test]
fn test_k2_export_derives_optional_geometry() {
    let bytes = load_fixture("k2_pandc.csv");
    let report = pipeline().process_batch(&bytes, None).unwrap();

    assert_eq!(report.diagnostics.detected_schema, SchemaKind::K2);
    assert!(
        report
            .diagnostics
            .derived_columns
            .contains(&"transit_depth".to_string())
    );
    assert_eq!(report.summary.predicted, 3);

    let RowOutcome::Predicted { input, .. } = &report.results[2] else {
        panic!("row 2 should be predicted");
    };
    // Blank stellar context falls back to a Sun-like host.
    assert_eq!(input.stellar_mass, 1.0);
    assert_eq!(input.stellar_temperature, 5778.0);
    assert_eq!(input.model_feature("v_mag"), Some(11.9));
    assert!(input.transit_depth.is_some());
    assert!(input.transit_duration.is_some());
}

#[test]
fn test_mission_hint_overrides_detection() {
    let bytes = load_fixture("generic_radii.csv");
    let preview = pipeline().preview(&bytes, Some(SchemaKind::K2)).unwrap();

    assert_eq!(preview.diagnostics.detected_schema, SchemaKind::K2);
    assert_eq!(preview.diagnostics.schema_source, SchemaSource::Hint);
    assert!(!preview.diagnostics.defaulted_schema);
}

// ============================================================================
// Row-Level Failures
// ============================================================================

#[test]
fn test_batch_reports_bad_row_and_continues() {
    let bytes = load_fixture("corrupted_batch.csv");
    let report = pipeline().process_batch(&bytes, None).unwrap();
    let s = &report.summary;

    assert_eq!(s.total_rows, 5);
    assert_eq!(s.predicted, 4);
    assert_eq!(s.failed, 1);

    let failed: Vec<_> = report.results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    let RowOutcome::Failed { row, error } = failed[0] else {
        unreachable!();
    };
    assert_eq!(*row, 2);
    assert_eq!(error.field(), "orbital_period");
    assert_eq!(error.error_code(), "INVALID_NUMBER");
    if let RowError::InvalidNumber { value, row_sample, .. } = error {
        assert_eq!(value, "12.x3");
        assert_eq!(row_sample["koi_disposition"], "CANDIDATE");
    }

    // Rows 1, 3 and 4 agree with the catalog, row 0 does not.
    assert_eq!(s.labelled, 4);
    assert_eq!(s.agreements, 3);
    assert_eq!(s.accuracy, Some(0.75));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][2]["status"], "failed");
    assert_eq!(json["results"][2]["error"]["error"], "invalid_number");
}

#[test]
fn test_single_row_aborts_on_bad_first_row() {
    let csv = b"koi_period,koi_duration,koi_depth,koi_srad\n12.x3,2.5,1500,0.95\n8.8,2.0,400,1.05\n";
    let err = pipeline().process_single(csv, None).unwrap_err();

    assert!(matches!(err, ReconcileError::Row { row: 0, .. }));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "INVALID_NUMBER");
    assert_eq!(json["detail"]["field"], "orbital_period");
}

#[test]
fn test_missing_required_value_without_derivation() {
    // No planet radius, so a blank depth cannot be derived.
    let csv = b"koi_period,koi_duration,koi_depth,koi_srad\n12.3,2.5,,0.95\n";
    let err = pipeline().process_single(csv, None).unwrap_err();
    assert_eq!(err.error_code(), "MISSING_VALUE");
    assert_eq!(err.detail().unwrap()["field"], "transit_depth");
}

// ============================================================================
// File-Level Failures
// ============================================================================

#[test]
fn test_missing_columns_detail() {
    let csv = b"kepid,koi_period,koi_score\n1,10.0,0.9\n";
    let err = pipeline().process_batch(csv, None).unwrap_err();

    assert_eq!(err.error_code(), "MISSING_COLUMNS");
    assert!(err.is_data_error());
    let detail = err.detail().unwrap();
    assert_eq!(detail["model_type"], "kepler");
    let missing: Vec<&str> = detail["missing"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(
        missing,
        vec!["transit_duration", "transit_depth", "stellar_radius"]
    );
    assert!(
        detail["available_columns"]
            .as_array()
            .unwrap()
            .contains(&"kepid".into())
    );
}

#[test]
fn test_strict_schema_rejects_unknown_layout() {
    let bytes = load_fixture("generic_radii.csv");
    let pipeline = Pipeline::builder()
        .config(ReconcileConfig::builder().strict_schema(true).build().unwrap())
        .build()
        .unwrap();

    let err = pipeline.process_batch(&bytes, None).unwrap_err();
    assert_eq!(err.error_code(), "SCHEMA_UNDETERMINED");
    assert!(matches!(err, ReconcileError::SchemaUndetermined { ref columns } if columns.len() == 3));
}

#[test]
fn test_comment_only_file() {
    let err = pipeline().preview(b"# nothing here\n#\n", None).unwrap_err();
    assert!(matches!(err, ReconcileError::EmptyTable));
}

#[test]
fn test_latin1_bytes_are_decoded() {
    // 0xE9 is 'é' in Windows-1252 and invalid on its own in UTF-8.
    let csv = b"koi_period,koi_duration,koi_depth,koi_srad,kepler_name\n12.3,2.5,1500,0.95,Caf\xe9\n";
    let preview = pipeline().preview(csv, None).unwrap();
    assert_eq!(preview.diagnostics.encoding, "UTF-8");
    assert!(preview.diagnostics.decode_errors);
    assert_eq!(preview.sample_rows[0]["orbital_period"], "12.3");

    let pipeline = Pipeline::builder()
        .config(
            ReconcileConfig::builder()
                .fallback_encoding("windows-1252")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let preview = pipeline.preview(csv, None).unwrap();
    assert_eq!(preview.diagnostics.encoding, "windows-1252");
    assert!(!preview.diagnostics.decode_errors);
    assert_eq!(preview.sample_rows[0]["kepler_name"], "Caf\u{e9}");
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_round_trip() {
    for schema in SchemaKind::KNOWN {
        let csv = template::render(schema).unwrap();
        // Drop the trailing blank row; it carries no values.
        let example: String = csv.lines().take(2).map(|l| format!("{}\n", l)).collect();

        let analysis = pipeline()
            .process_single(example.as_bytes(), Some(schema))
            .unwrap_or_else(|e| panic!("{} template should reconcile: {}", schema, e));

        assert_eq!(analysis.features.schema, schema);
        assert_eq!(analysis.features.orbital_period, 10.5);
        assert_eq!(analysis.features.stellar_radius, 0.95);
        assert_eq!(analysis.features.model_feature("radius"), Some(1.2));
    }
}

// ============================================================================
// Model Registry
// ============================================================================

#[test]
fn test_registry_loads_models_and_falls_back() {
    let dir = scratch_dir("registry");
    fs::write(
        dir.join("kepler.json"),
        serde_json::to_string(&depth_model()).unwrap(),
    )
    .unwrap();
    fs::write(dir.join("tess.json"), "{ not json").unwrap();

    let registry = ModelRegistry::load_dir(&dir).unwrap();
    assert_eq!(registry.schemas(), vec![SchemaKind::Kepler]);

    let pipeline = Pipeline::builder()
        .registry(Arc::new(registry))
        .build()
        .unwrap();

    let kepler = pipeline
        .process_batch(&load_fixture("kepler_cumulative.csv"), None)
        .unwrap();
    for outcome in &kepler.results {
        let RowOutcome::Predicted { prediction, .. } = outcome else {
            panic!("every Kepler row should be predicted");
        };
        assert_eq!(prediction.model, "kepler-depth");
        assert!(!prediction.used_fallback);
    }
    let RowOutcome::Predicted { prediction, .. } = &kepler.results[1] else {
        unreachable!();
    };
    assert_eq!(prediction.prediction.label, PredictionLabel::Exoplanet);

    // The broken TESS artifact was skipped, so TESS rows use the stand-in.
    let tess = pipeline
        .process_batch(&load_fixture("tess_toi.csv"), None)
        .unwrap();
    let RowOutcome::Predicted { prediction, .. } = &tess.results[0] else {
        panic!("row 0 should be predicted");
    };
    assert_eq!(prediction.model, "rule_based");
    assert!(prediction.used_fallback);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_registry_missing_directory() {
    let dir = std::env::temp_dir().join("exo-processing-does-not-exist");
    assert!(ModelRegistry::load_dir(dir).is_err());
}
