use crate::diagnostics::Diagnostic;
use crate::types::{CleaningResult, CleaningSummary, StageReports};
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Report of a single pipeline run.
///
/// Used both for JSON output to stdout (`--json`) and for the report file
/// written next to the cleaned CSV (`--emit-report`).
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, when the run started from a file
    pub input_file: Option<String>,
    /// Path to the output file, if saving was requested
    pub output_file: Option<String>,
    /// Whether the cleaned table was written
    pub persisted: bool,
    /// Final shape and per-stage counters
    pub summary: CleaningSummary,
    /// Detailed per-stage outcomes
    pub stages: StageReports,
    /// Number of non-info diagnostics
    pub warning_count: usize,
    /// All diagnostics in emission order
    pub diagnostics: Vec<Diagnostic>,
    /// Final column name and dtype, in order
    pub columns: Vec<ColumnDescription>,
}

/// Name and dtype of an output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    pub dtype: String,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds and writes [`CleaningReport`]s.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Build a report from a pipeline result.
    pub fn build_report(input_file: Option<&Path>, result: &CleaningResult) -> CleaningReport {
        let columns = result
            .data
            .get_columns()
            .iter()
            .map(|col| ColumnDescription {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
            })
            .collect();

        CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(|p| p.display().to_string()),
            output_file: result.output_path.as_ref().map(|p| p.display().to_string()),
            persisted: result.persisted,
            summary: result.summary.clone(),
            stages: result.stages.clone(),
            warning_count: result
                .diagnostics
                .iter()
                .filter(|d| d.kind.is_warning())
                .count(),
            diagnostics: result.diagnostics.clone(),
            columns,
        }
    }

    /// Path of the report written alongside `output_path`: `<stem>_report.json`.
    pub fn report_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cleaned".to_string());
        output_path.with_file_name(format!("{}_report.json", stem))
    }

    /// Write a report as pretty-printed JSON, creating parent directories.
    pub fn write_report(report: &CleaningReport, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create '{}'", path.display()))?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());

        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::pipeline::PipelineStage;
    use polars::prelude::*;
    use tempfile::tempdir;

    fn sample_result() -> CleaningResult {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info(PipelineStage::Deduplication, None, "No duplicate rows found");
        diagnostics.missing_column(PipelineStage::TypeCoercion, "Aircraft_Type");

        CleaningResult {
            data: df![
                "Airline" => ["Delta", "United"],
                "Passenger_Count" => [150i64, 151],
            ]
            .unwrap(),
            diagnostics: diagnostics.into_records(),
            summary: CleaningSummary {
                rows_before: 3,
                rows_after: 2,
                duplicates_removed: 1,
                ..Default::default()
            },
            stages: StageReports::default(),
            output_path: Some(PathBuf::from("outputs/cleaned_flights.csv")),
            persisted: true,
        }
    }

    #[test]
    fn test_report_path_next_to_output() {
        assert_eq!(
            ReportGenerator::report_path(Path::new("outputs/cleaned_flights.csv")),
            PathBuf::from("outputs/cleaned_flights_report.json")
        );
    }

    #[test]
    fn test_build_report() {
        let report = ReportGenerator::build_report(Some(Path::new("flights.csv")), &sample_result());

        assert_eq!(report.input_file.as_deref(), Some("flights.csv"));
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.diagnostics[1].column.as_deref(), Some("Aircraft_Type"));
        assert_eq!(
            report.columns[1],
            ColumnDescription {
                name: "Passenger_Count".to_string(),
                dtype: "i64".to_string(),
            }
        );
    }

    #[test]
    fn test_write_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("run_report.json");
        let report = ReportGenerator::build_report(None, &sample_result());

        let written = ReportGenerator::write_report(&report, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(json["summary"]["duplicates_removed"], 1);
        assert_eq!(json["diagnostics"][1]["kind"], "missing_column");
        assert!(json["generated_at"].is_string());
    }
}
