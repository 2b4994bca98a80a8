use crate::cleaner::{CoercionReport, DeduplicationReport, PruningReport};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::imputers::ImputationReport;
use crate::pipeline::OutlierReport;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value kind of a column, as the pipeline reasons about it.
///
/// Stages dispatch on this once per column rather than inspecting cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Floating point measurements (distances, fractions, prices).
    Continuous,
    /// Whole-number values (counts, flags, HHMM times).
    Discrete,
    /// Labels and free text.
    Categorical,
}

impl ColumnKind {
    /// Classify an existing polars dtype.
    ///
    /// Booleans and temporal types are treated as categorical: they have no
    /// meaningful median.
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float32 | DataType::Float64 => Self::Continuous,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Self::Discrete,
            _ => Self::Categorical,
        }
    }

    /// The polars dtype a column of this kind is coerced to.
    ///
    /// Categorical columns are kept as plain strings.
    pub fn target_dtype(&self) -> DataType {
        match self {
            Self::Continuous => DataType::Float64,
            Self::Discrete => DataType::Int64,
            Self::Categorical => DataType::String,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Continuous | Self::Discrete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
            Self::Categorical => "categorical",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the expected schema: a column and the kind it must end up as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub column: String,
    pub kind: ColumnKind,
}

impl SchemaEntry {
    pub fn new(column: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }
}

// ============================================================================
// Cleaning Summary Types
// ============================================================================

/// Counters describing what a pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows handed to the first stage.
    pub rows_before: usize,
    /// Number of rows in the cleaned table.
    pub rows_after: usize,
    /// Number of columns handed to the first stage.
    pub columns_before: usize,
    /// Number of columns in the cleaned table.
    pub columns_after: usize,

    /// Missing cells filled by the imputer.
    pub cells_imputed: usize,
    /// Columns the imputer filled.
    pub columns_imputed: usize,
    /// Rows dropped as exact duplicates.
    pub duplicates_removed: usize,
    /// Identifier column dropped by the pruner, if any.
    pub pruned_column: Option<String>,
    /// Values whose standard score exceeded the threshold (reported only).
    pub outliers_detected: usize,
    /// Values moved onto a clamp bound by the general statistical clamp.
    pub values_clamped: usize,
    /// Columns converted to their expected kind.
    pub columns_coerced: usize,
    /// Columns whose coercion was abandoned.
    pub coercion_failures: usize,
}

impl CleaningSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of input rows removed (0.0 - 100.0).
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            self.rows_before.saturating_sub(self.rows_after) as f64 / self.rows_before as f64
                * 100.0
        }
    }
}

/// Per-stage reports of a pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageReports {
    pub imputation: ImputationReport,
    pub deduplication: DeduplicationReport,
    pub pruning: PruningReport,
    pub outliers: OutlierReport,
    pub coercion: CoercionReport,
}

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// The cleaned table.
    pub data: DataFrame,
    /// Every diagnostic recorded by the stages, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    pub summary: CleaningSummary,
    pub stages: StageReports,
    /// Where the table was (or was meant to be) written.
    pub output_path: Option<PathBuf>,
    /// False when saving was requested but the write failed.
    pub persisted: bool,
}

impl CleaningResult {
    /// True unless a stage failed or a requested write failed.
    pub fn is_complete(&self) -> bool {
        let stages_ok = !self
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::StageFailure);
        stages_ok && (self.output_path.is_none() || self.persisted)
    }
}
