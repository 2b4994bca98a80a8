//! Flight Data Cleaning Library
//!
//! A deterministic cleaning pipeline for tabular flight records, built with
//! Rust and Polars.
//!
//! # Overview
//!
//! The pipeline runs five stages in a fixed order:
//!
//! - **Imputation**: Median for numeric columns, most frequent value otherwise
//! - **Deduplication**: Exact duplicate rows removed, first occurrence kept
//! - **Column Pruning**: The flight identifier column dropped
//! - **Outlier Treatment**: Z-score report, load factor cap, delay rounding
//!   and a `mean ± 3·std` clamp
//! - **Type Coercion**: Every known column converted to its expected kind
//!
//! Irregularities that do not stop the run (missing columns, undefined
//! statistics, failed coercions, failed writes) are returned as
//! [`Diagnostic`]s alongside the cleaned table. Only an unavailable input
//! aborts a run.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use flight_cleaning::{Pipeline, PipelineConfig};
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .build()?
//!     .run_file("data/flights.csv")?;
//!
//! println!("{} rows cleaned", result.data.height());
//! for diagnostic in &result.diagnostics {
//!     println!("{}", diagnostic);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize cleaning behavior:
//!
//! ```rust,ignore
//! use flight_cleaning::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .output_path("results/flights_clean.csv")
//!     .z_threshold(3.5)
//!     .remove_duplicates(false)
//!     .generate_report(true)
//!     .build()?;
//! ```
//!
//! # Running Stages Individually
//!
//! Each stage implements [`CleaningStage`] and can be applied on its own:
//!
//! ```rust,ignore
//! use flight_cleaning::{CleaningStage, Diagnostics, StatisticalImputer};
//!
//! let mut diagnostics = Diagnostics::new();
//! let (df, report) = StatisticalImputer.apply(df, &mut diagnostics)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{
    CoercionReport, ColumnPruner, DeduplicationReport, Deduplicator, PruningReport, TypeCoercer,
};
pub use config::{ConfigValidationError, EXPECTED_SCHEMA, PipelineConfig, PipelineConfigBuilder};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::CleaningError;
pub use imputers::{FillPolicy, ImputationReport, StatisticalImputer};
pub use io::{load_csv, write_csv};
pub use pipeline::{
    CleaningStage, ClosureProgressReporter, ColumnOutlierReport, OutlierReport, OutlierTreater,
    Pipeline, PipelineBuilder, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use reporting::{CleaningReport, ReportGenerator};
pub use types::{CleaningResult, CleaningSummary, ColumnKind, SchemaEntry, StageReports};
