//! Statistical imputation.
//!
//! Numeric columns are filled with their median, everything else with its
//! most frequent value. The policy is chosen once per column from its kind.

use crate::diagnostics::Diagnostics;
use crate::pipeline::{CleaningStage, PipelineStage};
use crate::types::ColumnKind;
use crate::utils::{
    column_names, fill_numeric_nulls, fill_nulls_from_index, median, present_f64_values,
    stable_mode,
};
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// How a column's missing cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    Median,
    Mode,
}

impl FillPolicy {
    pub fn for_kind(kind: ColumnKind) -> Self {
        if kind.is_numeric() {
            Self::Median
        } else {
            Self::Mode
        }
    }
}

/// What the imputer did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImputationReport {
    /// Columns that had missing cells and were filled.
    pub columns_imputed: usize,
    /// Total number of cells filled.
    pub cells_imputed: usize,
    /// Columns left with missing cells because no statistic existed.
    pub skipped_columns: Vec<String>,
}

/// Fills missing cells with a per-column median or mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every column that has at least one missing cell.
    pub fn impute(
        &self,
        mut df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, ImputationReport)> {
        let mut report = ImputationReport::default();

        for col_name in column_names(&df) {
            let series = df.column(&col_name)?.as_materialized_series().clone();
            let missing = series.null_count();
            if missing == 0 {
                continue;
            }

            let kind = ColumnKind::of(series.dtype());
            let policy = FillPolicy::for_kind(kind);
            debug!(
                "Imputing '{}' ({}, {} missing) with {:?}",
                col_name, kind, missing, policy
            );

            let filled = match policy {
                FillPolicy::Median => Self::fill_median(&series, diagnostics)?,
                FillPolicy::Mode => Self::fill_mode(&series, diagnostics)?,
            };

            match filled {
                Some(filled) => {
                    df.replace(&col_name, filled)
                        .with_context(|| format!("Failed to replace column '{}'", col_name))?;
                    report.columns_imputed += 1;
                    report.cells_imputed += missing;
                }
                None => report.skipped_columns.push(col_name),
            }
        }

        let remaining: usize = df.get_columns().iter().map(|col| col.null_count()).sum();
        if remaining > 0 {
            warn!(
                "{} missing values remain in columns without present values",
                remaining
            );
        }

        Ok((df, report))
    }

    /// Median fill for numeric columns. `None` if the column has no present values.
    fn fill_median(series: &Series, diagnostics: &mut Diagnostics) -> Result<Option<Series>> {
        let name = series.name().to_string();
        let values = present_f64_values(series)?;

        let Some(median_val) = median(&values) else {
            diagnostics.undefined_statistic(
                PipelineStage::Imputation,
                &name,
                format!("Column '{}' has no present values; median undefined, left unfilled", name),
            );
            return Ok(None);
        };

        let filled = fill_numeric_nulls(series, median_val)?;
        diagnostics.info(
            PipelineStage::Imputation,
            Some(&name),
            format!(
                "Filled {} missing values in '{}' with median: {}",
                series.null_count(),
                name,
                median_val
            ),
        );
        Ok(Some(filled))
    }

    /// Mode fill for categorical and other columns. `None` if the column has no present values.
    fn fill_mode(series: &Series, diagnostics: &mut Diagnostics) -> Result<Option<Series>> {
        let name = series.name().to_string();

        let Some((mode_val, count, first_idx)) = stable_mode(series)? else {
            diagnostics.undefined_statistic(
                PipelineStage::Imputation,
                &name,
                format!("Column '{}' has no present values; mode undefined, left unfilled", name),
            );
            return Ok(None);
        };

        let filled = fill_nulls_from_index(series, first_idx)?;
        diagnostics.info(
            PipelineStage::Imputation,
            Some(&name),
            format!(
                "Filled {} missing values in '{}' with mode: '{}' ({} occurrences)",
                series.null_count(),
                name,
                mode_val,
                count
            ),
        );
        Ok(Some(filled))
    }
}

impl CleaningStage for StatisticalImputer {
    type Report = ImputationReport;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Imputation
    }

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, ImputationReport)> {
        self.impute(df, diagnostics)
    }
}
