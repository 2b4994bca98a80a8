//! Type coercion to the expected schema.

use super::converters::{ConversionError, convert};
use crate::diagnostics::Diagnostics;
use crate::pipeline::{CleaningStage, PipelineStage};
use crate::types::SchemaEntry;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// What the coercer did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoercionReport {
    /// Columns converted to their expected dtype.
    pub coerced: Vec<String>,
    /// Columns already at their expected dtype.
    pub unchanged: Vec<String>,
    /// Columns whose conversion was abandoned.
    pub failed: Vec<String>,
    /// Schema columns not present in the table.
    pub missing: Vec<String>,
}

/// Converts each schema column to the dtype of its expected kind.
///
/// Conversion is atomic per column: either every present cell converts, or
/// the column is left exactly as it was.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    schema: Vec<SchemaEntry>,
}

impl TypeCoercer {
    pub fn new(schema: Vec<SchemaEntry>) -> Self {
        Self { schema }
    }

    /// Coerce every schema column present in `df`.
    pub fn coerce(
        &self,
        mut df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, CoercionReport)> {
        let mut report = CoercionReport::default();

        for entry in &self.schema {
            let column = entry.column.as_str();
            let Ok(col) = df.column(column) else {
                diagnostics.missing_column(PipelineStage::TypeCoercion, column);
                report.missing.push(column.to_string());
                continue;
            };

            let series = col.as_materialized_series();
            let target = entry.kind.target_dtype();
            if series.dtype() == &target {
                debug!("Column '{}' is already {}", column, entry.kind);
                report.unchanged.push(column.to_string());
                continue;
            }

            let source_dtype = series.dtype().clone();
            match convert(series, entry.kind) {
                Ok(converted) => {
                    df.replace(column, converted)
                        .with_context(|| format!("Failed to replace column '{}'", column))?;
                    diagnostics.info(
                        PipelineStage::TypeCoercion,
                        Some(column),
                        format!(
                            "Converted '{}' from {} to {} ({})",
                            column, source_dtype, target, entry.kind
                        ),
                    );
                    report.coerced.push(column.to_string());
                }
                Err(ConversionError::Rejected { value, target: kind }) => {
                    diagnostics.coercion_failure(
                        PipelineStage::TypeCoercion,
                        column,
                        format!(
                            "Could not convert '{}' to {}: offending value '{}'; column kept as {}",
                            column, kind, value, source_dtype
                        ),
                    );
                    report.failed.push(column.to_string());
                }
                Err(ConversionError::Polars(e)) => {
                    diagnostics.coercion_failure(
                        PipelineStage::TypeCoercion,
                        column,
                        format!(
                            "Could not convert '{}' to {}: {}; column kept as {}",
                            column, entry.kind, e, source_dtype
                        ),
                    );
                    report.failed.push(column.to_string());
                }
            }
        }

        Ok((df, report))
    }
}

impl Default for TypeCoercer {
    fn default() -> Self {
        Self::new(crate::config::EXPECTED_SCHEMA.clone())
    }
}

impl CleaningStage for TypeCoercer {
    type Report = CoercionReport;

    fn stage(&self) -> PipelineStage {
        PipelineStage::TypeCoercion
    }

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, CoercionReport)> {
        self.coerce(df, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::types::ColumnKind;

    fn coerce(df: DataFrame) -> (DataFrame, CoercionReport, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let (df, report) = TypeCoercer::default().coerce(df, &mut diagnostics).unwrap();
        (df, report, diagnostics)
    }

    #[test]
    fn test_schema_kinds_enforced() {
        let df = df![
            "Passenger_Count" => [150.0, 151.0],
            "Delay_Minutes" => [14.6, 0.0],
            "Flight_Distance" => [500i64, 700],
            "Scheduled_Departure_Time" => ["0930", "1415"],
            "Flight_Cancelled" => [false, true],
            "Airline" => ["Delta", "United"],
        ]
        .unwrap();

        let (df, report, _) = coerce(df);

        assert_eq!(df.column("Passenger_Count").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Delay_Minutes").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Flight_Distance").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            df.column("Scheduled_Departure_Time").unwrap().i64().unwrap().get(0),
            Some(930)
        );
        assert_eq!(
            df.column("Flight_Cancelled").unwrap().i64().unwrap().get(1),
            Some(1)
        );
        assert_eq!(df.column("Delay_Minutes").unwrap().i64().unwrap().get(0), Some(15));
        assert_eq!(report.unchanged, vec!["Airline".to_string()]);
        assert_eq!(report.coerced.len(), 5);
    }

    #[test]
    fn test_failed_column_is_untouched() {
        let df = df![
            "Ticket_Price" => ["250.00", "cheap", "199.99"],
            "Airline" => ["Delta", "United", "Delta"],
        ]
        .unwrap();

        let (out, report, diagnostics) = coerce(df.clone());

        let price = out.column("Ticket_Price").unwrap().as_materialized_series();
        assert_eq!(price.dtype(), &DataType::String);
        assert!(price.equals(df.column("Ticket_Price").unwrap().as_materialized_series()));
        assert_eq!(report.failed, vec!["Ticket_Price".to_string()]);

        let failures: Vec<_> = diagnostics
            .records()
            .iter()
            .filter(|d| d.kind == DiagnosticKind::CoercionFailure)
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("'cheap'"));
    }

    #[test]
    fn test_missing_schema_columns_reported() {
        let df = df!["Airline" => ["Delta"]].unwrap();

        let (_, report, diagnostics) = coerce(df);

        assert_eq!(report.missing.len(), 11);
        assert_eq!(diagnostics.count(DiagnosticKind::MissingColumn), 11);
    }

    #[test]
    fn test_columns_outside_schema_untouched() {
        let df = df![
            "Gate" => [12i64, 14],
            "Flight_Distance" => ["500", "700"],
        ]
        .unwrap();

        let coercer = TypeCoercer::new(vec![SchemaEntry::new(
            "Flight_Distance",
            ColumnKind::Continuous,
        )]);
        let mut diagnostics = Diagnostics::new();
        let (out, report) = coercer.coerce(df, &mut diagnostics).unwrap();

        assert_eq!(out.column("Gate").unwrap().dtype(), &DataType::Int64);
        assert_eq!(out.column("Flight_Distance").unwrap().dtype(), &DataType::Float64);
        assert_eq!(report.coerced, vec!["Flight_Distance".to_string()]);
    }

    #[test]
    fn test_nulls_pass_through() {
        let df = df!["Load_Factor" => [Some("0.8"), None]].unwrap();
        let coercer = TypeCoercer::new(vec![SchemaEntry::new(
            "Load_Factor",
            ColumnKind::Continuous,
        )]);
        let mut diagnostics = Diagnostics::new();
        let (out, _) = coercer.coerce(df, &mut diagnostics).unwrap();

        let load = out.column("Load_Factor").unwrap();
        assert_eq!(load.dtype(), &DataType::Float64);
        assert_eq!(load.null_count(), 1);
    }
}
