//! CLI entry point for exoplanet catalog reconciliation.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use exo_processing::predict::ModelRegistry;
use exo_processing::utils::truncate_str;
use exo_processing::{
    BatchReport, Pipeline, PreviewReport, ReconcileConfig, ReconcileError, RowAnalysis,
    RowOutcome, SchemaKind, template,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Environment variable naming the model directory when `--models` is absent.
const MODEL_DIR_ENV: &str = "EXO_MODEL_DIR";

/// CLI-compatible mission enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMission {
    /// Kepler cumulative KOI table
    Kepler,
    /// K2 planets and candidates table
    K2,
    /// TESS objects of interest table
    Tess,
    /// Unrecognized layout; uses the configured fallback contract
    Generic,
}

impl From<CliMission> for SchemaKind {
    fn from(cli: CliMission) -> Self {
        match cli {
            CliMission::Kepler => SchemaKind::Kepler,
            CliMission::K2 => SchemaKind::K2,
            CliMission::Tess => SchemaKind::Tess,
            CliMission::Generic => SchemaKind::Generic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exoplanet catalog reconciliation and classification",
    long_about = "Reconciles Kepler, K2 and TESS catalog exports onto a canonical feature set \
                  and classifies each candidate.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  EXO_MODEL_DIR    Directory holding kepler.json, k2.json and tess.json models\n\n\
                  EXAMPLES:\n  \
                  # Classify the first row, detecting the mission\n  \
                  exo-processing -i cumulative.csv\n\n  \
                  # Classify every row of a TOI export\n  \
                  exo-processing -i toi.csv --mission tess --batch\n\n  \
                  # Show what the reconciler did with the columns\n  \
                  exo-processing -i custom.csv --preview\n\n  \
                  # Print an input template for K2\n  \
                  exo-processing --template k2"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long, required_unless_present = "template")]
    input: Option<String>,

    /// Mission the file was exported from
    ///
    /// If not specified, the mission is detected from the column names
    #[arg(short, long, value_enum)]
    mission: Option<CliMission>,

    /// Classify every row instead of only the first
    #[arg(long, conflicts_with = "preview")]
    batch: bool,

    /// Show reconciliation diagnostics and sample rows without classifying
    #[arg(long)]
    preview: bool,

    /// Print a CSV template for a mission and exit
    #[arg(long, value_enum)]
    template: Option<CliMission>,

    /// Directory holding trained model artifacts
    #[arg(long)]
    models: Option<String>,

    /// Fail on files whose mission cannot be identified
    #[arg(long)]
    strict_schema: bool,

    /// Number of lines searched for the header row
    #[arg(long, default_value = "200")]
    header_window: usize,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if let Some(mission) = args.template {
        print!("{}", template::render(mission.into())?);
        return Ok(());
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("--input is required"))?;
    let path = Path::new(input);
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", input));
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(anyhow!("Input must be a .csv file: {}", input));
    }

    info!("Loading catalog from: {}", input);
    let bytes = std::fs::read(path)?;

    let config = ReconcileConfig::builder()
        .header_search_window(args.header_window)
        .strict_schema(args.strict_schema)
        .build()?;

    let pipeline = Pipeline::builder()
        .config(config)
        .registry(Arc::new(load_registry(&args)?))
        .build()?;

    let hint = args.mission.map(SchemaKind::from);

    if args.preview {
        let report = pipeline.preview(&bytes, hint).map_err(|e| fail(e, args.json))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_preview(&report, input);
        }
    } else if args.batch {
        let report = pipeline.process_batch(&bytes, hint).map_err(|e| fail(e, args.json))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_batch(&report, input);
        }
    } else {
        let analysis = pipeline.process_single(&bytes, hint).map_err(|e| fail(e, args.json))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        } else {
            print_single(&analysis, input);
        }
    }

    Ok(())
}

/// Registry from `--models`, then `EXO_MODEL_DIR`, else rule-based only.
fn load_registry(args: &Args) -> Result<ModelRegistry> {
    let dir = args
        .models
        .clone()
        .or_else(|| std::env::var(MODEL_DIR_ENV).ok());

    match dir {
        Some(dir) => {
            let registry = ModelRegistry::load_dir(&dir)?;
            if registry.schemas().is_empty() {
                warn!("No models found in {}; using rule-based predictions", dir);
            }
            Ok(registry)
        }
        None => {
            info!("No model directory configured; using rule-based predictions");
            Ok(ModelRegistry::rule_based())
        }
    }
}

/// With `--json`, write the structured error to stdout before failing.
fn fail(err: ReconcileError, json: bool) -> anyhow::Error {
    if json && let Ok(text) = serde_json::to_string_pretty(&err) {
        println!("{}", text);
    }
    err.into()
}

fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));
    println!();
}

fn print_schema_line(report_schema: SchemaKind, effective: SchemaKind, defaulted: bool) {
    if defaulted {
        println!(
            "Schema: {} (unrecognized, using {} contract)",
            report_schema, effective
        );
    } else {
        println!("Schema: {}", report_schema);
    }
}

fn print_preview(report: &PreviewReport, input: &str) {
    let d = &report.diagnostics;

    print_header("RECONCILIATION PREVIEW");
    println!("Input: {} ({} rows)", input, d.row_count);
    println!(
        "Encoding: {}{}",
        d.encoding,
        if d.decode_errors { " (malformed bytes replaced)" } else { "" }
    );
    println!(
        "Header: line {} (content starts at line {}), parsed {:?}",
        d.header_line_index, d.start_line_index, d.parse_strategy
    );
    println!("  {}", truncate_str(&d.header_line_preview, 76));
    print_schema_line(d.detected_schema, d.effective_schema, d.defaulted_schema);
    println!();

    println!("Renamed Columns:");
    println!("{}", "-".repeat(40));
    if d.rename_map.is_empty() {
        println!("  (none)");
    }
    for rename in &d.rename_map {
        println!("  {} -> {} ({:?})", rename.source, rename.canonical, rename.via);
    }
    println!();

    if !d.derived_columns.is_empty() {
        println!("Derived Columns: {}", d.derived_columns.join(", "));
    }
    if d.depth_converted_from_ppm {
        println!("Transit depth converted from ppm to fraction");
    }
    println!("Final Columns: {}", d.final_columns.len());
    println!();

    println!("Sample Rows:");
    println!("{}", "-".repeat(40));
    for (i, row) in report.sample_rows.iter().enumerate() {
        let text = serde_json::to_string(row).unwrap_or_default();
        println!("  [{}] {}", i, truncate_str(&text, 120));
    }
    println!("{}", "=".repeat(80));
}

fn print_single(analysis: &RowAnalysis, input: &str) {
    let d = &analysis.diagnostics;
    let p = &analysis.prediction;
    let dist = &p.prediction.probability_distribution;

    print_header("CLASSIFICATION RESULT");
    println!("Input: {} (row {} of {})", input, analysis.row, d.row_count);
    print_schema_line(d.detected_schema, d.effective_schema, d.defaulted_schema);
    println!();

    println!("Prediction: {}", p.prediction.label);
    println!("Confidence: {:.1}%", p.prediction.confidence * 100.0);
    println!(
        "Probabilities: exoplanet {:.2}, candidate {:.2}, false positive {:.2}",
        dist.exoplanet, dist.candidate, dist.false_positive
    );
    println!(
        "Model: {}{}",
        p.model,
        if p.used_fallback { " (fallback)" } else { "" }
    );
    println!();
    println!("{}", p.interpretation);
    println!();
    println!("Use --batch to classify every row, --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

fn print_batch(report: &BatchReport, input: &str) {
    let s = &report.summary;
    let d = &report.diagnostics;

    print_header("BATCH CLASSIFICATION COMPLETE");
    println!("Input: {} ({} rows)", input, s.total_rows);
    println!("Generated: {}", report.generated_at);
    print_schema_line(d.detected_schema, d.effective_schema, d.defaulted_schema);
    println!();

    println!("Rows: {} predicted, {} failed", s.predicted, s.failed);

    if let Some(column) = &s.disposition_column {
        println!();
        println!("Catalog Dispositions ({}):", column);
        println!("  Confirmed:      {}", s.dispositions.confirmed);
        println!("  Candidate:      {}", s.dispositions.candidate);
        println!("  False positive: {}", s.dispositions.false_positive);
        println!("  Unrecognized:   {}", s.dispositions.unrecognized);
        if let Some(accuracy) = s.accuracy {
            println!(
                "  Agreement: {}/{} ({:.1}%)",
                s.agreements,
                s.labelled,
                accuracy * 100.0
            );
        }
    }

    let failures: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| match r {
            RowOutcome::Failed { row, error } => Some((row, error)),
            RowOutcome::Predicted { .. } => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("Failed Rows:");
        for (row, error) in failures.iter().take(10) {
            println!("  ! row {}: {}", row, error);
        }
        if failures.len() > 10 {
            println!("  ... and {} more", failures.len() - 10);
        }
    }

    println!();
    println!("Use --json for per-row results");
    println!("{}", "=".repeat(80));
}
