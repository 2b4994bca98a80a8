//! CLI entry point for the flight data cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use flight_cleaning::config::DEFAULT_OUTPUT_PATH;
use flight_cleaning::{
    CleaningResult, ColumnKind, ColumnPruner, FillPolicy, Pipeline, PipelineConfig,
    ReportGenerator, load_csv,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Flight Data Cleaning Pipeline",
    long_about = "Cleans tabular flight records: fills missing values, removes duplicate rows,\n\
                  drops the flight identifier, treats outliers and enforces column types.\n\n\
                  EXAMPLES:\n  \
                  # Clean a file into outputs/cleaned_flights.csv\n  \
                  flight-cleaning -i data/flights.csv\n\n  \
                  # Choose the output file and write a JSON report next to it\n  \
                  flight-cleaning -i data/flights.csv -o results/clean.csv --emit-report\n\n  \
                  # Preview planned actions without cleaning\n  \
                  flight-cleaning -i data/flights.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the cleaned CSV file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Preview what the pipeline will do without cleaning
    ///
    /// Shows the dataset shape and the action planned for each column
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a JSON report next to the cleaned CSV
    ///
    /// The report will be saved as <output_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Keep exact duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Absolute z-score above which a value is reported as an outlier
    #[arg(long, default_value = "3.0")]
    z_threshold: f64,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
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

    let config = PipelineConfig::builder()
        .output_path(&args.output)
        .remove_duplicates(!args.keep_duplicates)
        .z_threshold(args.z_threshold)
        .generate_report(args.emit_report)
        .build()?;

    if args.dry_run {
        let data = load_csv(&args.input)?;
        info!("Dataset loaded successfully: {:?}", data.shape());
        return run_dry_run(&args, &config, &data);
    }

    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            tracing::debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    info!("{}", "=".repeat(80));
    info!("Starting flight data cleaning...");
    info!("{}", "=".repeat(80));

    match pipeline.run_file(&args.input) {
        Ok(result) => handle_pipeline_output(&result, &args),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Run dry-run mode - show what would happen without cleaning
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
/// It should always be visible regardless of log level settings.
fn run_dry_run(args: &Args, config: &PipelineConfig, data: &DataFrame) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning actions");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    println!("IMPUTATION");
    println!("{}", "-".repeat(40));
    let mut any_missing = false;
    for col in data.get_columns() {
        let missing = col.null_count();
        if missing > 0 {
            any_missing = true;
            let policy = FillPolicy::for_kind(ColumnKind::of(col.dtype()));
            println!("  {}: {} missing -> fill with {:?}", col.name(), missing, policy);
        }
    }
    if !any_missing {
        println!("  No missing values");
    }
    println!();

    println!("DEDUPLICATION");
    println!("{}", "-".repeat(40));
    if config.remove_duplicates {
        let unique_rows = data
            .unique_stable(None, UniqueKeepStrategy::First, None)?
            .height();
        println!(
            "  {} exact duplicate rows would be removed",
            data.height() - unique_rows
        );
    } else {
        println!("  Disabled (--keep-duplicates)");
    }
    println!();

    println!("COLUMN PRUNING");
    println!("{}", "-".repeat(40));
    let pruner = ColumnPruner::new(config.identifier_variants.iter().cloned());
    match pruner.find_identifier(data) {
        Some(identifier) => println!("  Drop identifier column '{}'", identifier),
        None => println!("  No identifier column found"),
    }
    println!();

    println!("OUTLIER TREATMENT");
    println!("{}", "-".repeat(40));
    for column in &config.outlier_columns {
        match data.column(column) {
            Ok(col) => {
                let mut action = format!(
                    "report |z| > {}, clamp to mean +/- {} std",
                    config.z_threshold, config.clamp_sigma
                );
                if *column == config.load_column {
                    action = format!("cap at {}, {}", config.load_upper_bound, action);
                } else if *column == config.delay_column {
                    action = format!("round, {}", action);
                }
                println!("  {} ({}): {}", column, col.dtype(), action);
            }
            Err(_) => println!("  {}: not present, skipped", column),
        }
    }
    println!();

    println!("TYPE COERCION");
    println!("{}", "-".repeat(40));
    for entry in &config.expected_schema {
        match data.column(&entry.column) {
            Ok(col) if col.dtype() == &entry.kind.target_dtype() => {
                println!("  {}: already {}", entry.column, entry.kind);
            }
            Ok(col) => println!(
                "  {}: {} -> {} ({})",
                entry.column,
                col.dtype(),
                entry.kind.target_dtype(),
                entry.kind
            ),
            Err(_) => println!("  {}: not present, skipped", entry.column),
        }
    }
    println!();

    println!("OUTPUT");
    println!("{}", "-".repeat(40));
    println!("  Cleaned data: {}", config.output_path.display());
    if config.generate_report {
        println!(
            "  Report: {}",
            ReportGenerator::report_path(&config.output_path).display()
        );
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
fn handle_pipeline_output(result: &CleaningResult, args: &Args) -> Result<()> {
    if !result.is_complete() {
        warn!("Cleaning did not complete (failed stage or unsaved output); see diagnostics");
    }

    if args.json {
        let report = ReportGenerator::build_report(Some(&args.input), result);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(result, &args.input);
    Ok(())
}

/// Print a human-readable summary of the cleaning results.
fn print_human_readable_summary(result: &CleaningResult, input: &Path) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        input.display(),
        summary.rows_before,
        summary.columns_before
    );
    match (&result.output_path, result.persisted) {
        (Some(path), true) => println!(
            "Output: {} ({} rows x {} columns)",
            path.display(),
            summary.rows_after,
            summary.columns_after
        ),
        (Some(path), false) => println!("Output: {} (NOT SAVED)", path.display()),
        (None, _) => println!("Output: not saved"),
    }
    println!();

    println!("Cleaning Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Missing values filled: {} in {} columns",
        summary.cells_imputed, summary.columns_imputed
    );
    println!(
        "  Duplicate rows removed: {} ({:.1}% of rows)",
        summary.duplicates_removed,
        summary.rows_removed_percentage()
    );
    println!(
        "  Identifier dropped: {}",
        summary.pruned_column.as_deref().unwrap_or("none")
    );
    println!(
        "  Outliers: {} reported, {} values clamped",
        summary.outliers_detected, summary.values_clamped
    );
    println!(
        "  Columns coerced: {} ({} failed)",
        summary.columns_coerced, summary.coercion_failures
    );
    println!();

    let warnings: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.kind.is_warning())
        .collect();
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings.iter().take(10) {
            println!("  ! {}", warning);
        }
        if warnings.len() > 10 {
            println!("  ... and {} more", warnings.len() - 10);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save a JSON report next to the cleaned data");
    println!("{}", "=".repeat(80));
}
