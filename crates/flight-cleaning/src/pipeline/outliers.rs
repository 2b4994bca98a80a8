//! Outlier treatment module.
//!
//! Standard scores use the sample standard deviation. Treatment runs in three
//! passes over the configured columns:
//!
//! 1. Report values whose |z| exceeds the threshold (nothing is modified).
//! 2. Apply the domain rules: cap the load column, round the delay column.
//! 3. Clamp every column to `mean ± sigma·std`, recomputed on current values.

use super::{CleaningStage, PipelineStage};
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::utils::{has_column, is_numeric_dtype, present_f64_values, sample_moments};
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Per-column outcome of outlier treatment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnOutlierReport {
    pub column: String,
    /// Values with |z| above the threshold before any modification.
    pub outliers_detected: usize,
    /// Values moved onto a clamp bound.
    pub values_clamped: usize,
    /// Clamp interval, absent when the standard deviation is undefined.
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// What the outlier treater did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutlierReport {
    pub columns: Vec<ColumnOutlierReport>,
    pub outliers_detected: usize,
    pub values_clamped: usize,
    pub load_values_capped: usize,
    pub delay_values_rounded: usize,
}

impl OutlierReport {
    pub fn column(&self, name: &str) -> Option<&ColumnOutlierReport> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Detects and treats outliers in the configured numeric columns.
#[derive(Debug, Clone)]
pub struct OutlierTreater {
    columns: Vec<String>,
    load_column: String,
    delay_column: String,
    z_threshold: f64,
    clamp_sigma: f64,
    load_upper_bound: f64,
}

impl OutlierTreater {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            columns: config.outlier_columns.clone(),
            load_column: config.load_column.clone(),
            delay_column: config.delay_column.clone(),
            z_threshold: config.z_threshold,
            clamp_sigma: config.clamp_sigma,
            load_upper_bound: config.load_upper_bound,
        }
    }

    pub fn treat(
        &self,
        mut df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, OutlierReport)> {
        let mut report = OutlierReport::default();
        let columns = self.numeric_columns(&df, diagnostics);

        // Pass 1: report only
        for column in &columns {
            let outliers = self.count_outliers(&df, column, diagnostics)?;
            report.outliers_detected += outliers;
            report.columns.push(ColumnOutlierReport {
                column: column.clone(),
                outliers_detected: outliers,
                ..Default::default()
            });
        }

        // Pass 2: domain rules
        if is_numeric_column(&df, &self.load_column) {
            let bound = self.load_upper_bound;
            let capped = map_column(&mut df, &self.load_column, |v| if v > bound { bound } else { v })?;
            report.load_values_capped = capped;
            diagnostics.info(
                PipelineStage::OutlierTreatment,
                Some(&self.load_column),
                format!(
                    "Capped {} values in '{}' at {}",
                    capped, self.load_column, bound
                ),
            );
        }

        if is_numeric_column(&df, &self.delay_column) {
            let rounded = map_column(&mut df, &self.delay_column, f64::round)?;
            report.delay_values_rounded = rounded;
            diagnostics.info(
                PipelineStage::OutlierTreatment,
                Some(&self.delay_column),
                format!(
                    "Rounded {} values in '{}' to whole minutes",
                    rounded, self.delay_column
                ),
            );
        }

        // Pass 3: statistical clamp on current values
        for column_report in &mut report.columns {
            let column = column_report.column.as_str();
            let values = present_f64_values(df.column(column)?.as_materialized_series())?;
            let Some((mean, std)) = sample_moments(&values) else {
                debug!("Standard deviation of '{}' undefined, not clamped", column);
                continue;
            };

            let lower = mean - self.clamp_sigma * std;
            let upper = mean + self.clamp_sigma * std;
            let clamped = map_column(&mut df, column, |v| v.clamp(lower, upper))?;

            column_report.values_clamped = clamped;
            column_report.lower_bound = Some(lower);
            column_report.upper_bound = Some(upper);
            report.values_clamped += clamped;

            diagnostics.info(
                PipelineStage::OutlierTreatment,
                Some(column),
                format!(
                    "Clamped {} values in '{}' to [{:.4}, {:.4}]",
                    clamped, column, lower, upper
                ),
            );
        }

        Ok((df, report))
    }

    /// Configured columns that exist and are numeric, in order.
    fn numeric_columns(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if !has_column(df, column) {
                diagnostics.missing_column(PipelineStage::OutlierTreatment, column);
            } else if !is_numeric_column(df, column) {
                diagnostics.undefined_statistic(
                    PipelineStage::OutlierTreatment,
                    column,
                    format!("Column '{}' is not numeric, skipping", column),
                );
            } else {
                columns.push(column.clone());
            }
        }
        columns
    }

    /// Number of present values whose |z| exceeds the threshold.
    fn count_outliers(
        &self,
        df: &DataFrame,
        column: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize> {
        let values = present_f64_values(df.column(column)?.as_materialized_series())?;
        let Some((mean, std)) = sample_moments(&values) else {
            diagnostics.undefined_statistic(
                PipelineStage::OutlierTreatment,
                column,
                format!(
                    "Standard score undefined for '{}' (fewer than two values or zero variance), no outliers reported",
                    column
                ),
            );
            return Ok(0);
        };

        let outliers = values
            .iter()
            .filter(|v| ((*v - mean) / std).abs() > self.z_threshold)
            .count();

        diagnostics.info(
            PipelineStage::OutlierTreatment,
            Some(column),
            format!(
                "Found {} outliers in '{}' (|z| > {})",
                outliers, column, self.z_threshold
            ),
        );
        Ok(outliers)
    }
}

impl Default for OutlierTreater {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl CleaningStage for OutlierTreater {
    type Report = OutlierReport;

    fn stage(&self) -> PipelineStage {
        PipelineStage::OutlierTreatment
    }

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, OutlierReport)> {
        self.treat(df, diagnostics)
    }
}

fn is_numeric_column(df: &DataFrame, column: &str) -> bool {
    df.column(column)
        .map(|col| is_numeric_dtype(col.dtype()))
        .unwrap_or(false)
}

/// Replace a column with `f` applied to each present value, as Float64.
///
/// Returns how many values changed. Nulls are preserved.
fn map_column<F>(df: &mut DataFrame, column: &str, f: F) -> Result<usize>
where
    F: Fn(f64) -> f64,
{
    let float_series = df.column(column)?.as_materialized_series().cast(&DataType::Float64)?;
    let ca = float_series.f64()?;

    let changed = ca
        .into_iter()
        .flatten()
        .filter(|&v| {
            let new = f(v);
            new != v && !(new.is_nan() && v.is_nan())
        })
        .count();

    let mapped = ca.apply(|v| v.map(&f));
    df.replace(column, mapped.into_series())
        .with_context(|| format!("Failed to replace column '{}'", column))?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    fn treat(df: DataFrame) -> (DataFrame, OutlierReport, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let (df, report) = OutlierTreater::default().treat(df, &mut diagnostics).unwrap();
        (df, report, diagnostics)
    }

    fn f64_values(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        df.column(column).unwrap().f64().unwrap().into_iter().collect()
    }

    /// 29 ordinary prices and one extreme one.
    fn prices_with_spike() -> Vec<f64> {
        let mut prices: Vec<f64> = (0..29).map(|i| 200.0 + (i % 5) as f64 * 10.0).collect();
        prices.push(5000.0);
        prices
    }

    #[test]
    fn test_reports_outliers_without_modifying_in_report_pass() {
        let prices = prices_with_spike();
        let df = df!["Ticket_Price" => prices.clone()].unwrap();

        let (_, report, _) = treat(df);

        let price = report.column("Ticket_Price").unwrap();
        assert_eq!(price.outliers_detected, 1);
        assert_eq!(report.outliers_detected, 1);
    }

    #[test]
    fn test_clamp_replaces_spike_with_upper_bound() {
        let prices = prices_with_spike();
        let (mean, std) = sample_moments(&prices).unwrap();
        let df = df!["Ticket_Price" => prices.clone()].unwrap();

        let (df, report, _) = treat(df);

        let values = f64_values(&df, "Ticket_Price");
        let expected_upper = mean + 3.0 * std;
        assert!((values[29].unwrap() - expected_upper).abs() < 1e-9);
        // Ordinary values are untouched
        for (i, price) in prices.iter().take(29).enumerate() {
            assert_eq!(values[i], Some(*price));
        }
        let column = report.column("Ticket_Price").unwrap();
        assert_eq!(column.values_clamped, 1);
        assert!((column.upper_bound.unwrap() - expected_upper).abs() < 1e-9);
    }

    #[test]
    fn test_values_within_reported_bounds() {
        let df = df![
            "Ticket_Price" => prices_with_spike(),
            "Flight_Distance" => (0..30).map(|i| if i == 7 { 90000.0 } else { 400.0 + i as f64 }).collect::<Vec<f64>>(),
        ]
        .unwrap();

        let (df, report, _) = treat(df);

        for column in &report.columns {
            let lower = column.lower_bound.unwrap();
            let upper = column.upper_bound.unwrap();
            for value in f64_values(&df, &column.column).into_iter().flatten() {
                assert!(value >= lower && value <= upper);
            }
        }
    }

    #[test]
    fn test_second_treatment_is_noop_when_nothing_exceeds_bounds() {
        let df = df!["Flight_Duration" => (1..=20).map(f64::from).collect::<Vec<f64>>()].unwrap();

        let (once, report, _) = treat(df.clone());
        let (twice, _, _) = treat(once.clone());

        assert_eq!(report.values_clamped, 0);
        assert!(once.equals(&df));
        assert!(twice.equals(&once));
    }

    #[test]
    fn test_second_treatment_recomputes_bounds() {
        let df = df!["Ticket_Price" => prices_with_spike()].unwrap();

        let (once, first, _) = treat(df);
        let once_values: Vec<f64> = f64_values(&once, "Ticket_Price")
            .into_iter()
            .flatten()
            .collect();
        let (mean, std) = sample_moments(&once_values).unwrap();
        let (twice, second, _) = treat(once);

        let first = first.column("Ticket_Price").unwrap();
        let second = second.column("Ticket_Price").unwrap();
        let upper = second.upper_bound.unwrap();
        let lower = second.lower_bound.unwrap();

        // Bounds come from the clamped values, so the spike is pulled in further
        assert!((upper - (mean + 3.0 * std)).abs() < 1e-9);
        assert!((lower - (mean - 3.0 * std)).abs() < 1e-9);
        assert!(upper < first.upper_bound.unwrap());
        assert_eq!(second.values_clamped, 1);

        let values = f64_values(&twice, "Ticket_Price");
        assert!((values[29].unwrap() - upper).abs() < 1e-9);
        for value in values.into_iter().flatten() {
            assert!(value >= lower && value <= upper);
        }
    }

    #[test]
    fn test_load_factor_capped_at_one() {
        let df = df!["Load_Factor" => [0.5, 1.2, 0.9, 1.0]].unwrap();

        let (df, report, _) = treat(df);

        let values = f64_values(&df, "Load_Factor");
        assert_eq!(values, vec![Some(0.5), Some(1.0), Some(0.9), Some(1.0)]);
        assert!(values.iter().flatten().all(|v| *v <= 1.0));
        assert_eq!(report.load_values_capped, 1);
    }

    #[test]
    fn test_load_factor_has_no_lower_bound() {
        let df = df!["Load_Factor" => [-0.2, 0.4, 0.6]].unwrap();

        let (df, _, _) = treat(df);

        assert_eq!(f64_values(&df, "Load_Factor")[0], Some(-0.2));
    }

    #[test]
    fn test_delay_minutes_rounded() {
        let df = df!["Delay_Minutes" => [14.4, 15.5, -2.5, 0.0]].unwrap();

        let (df, report, _) = treat(df);

        let values = f64_values(&df, "Delay_Minutes");
        assert_eq!(values, vec![Some(14.0), Some(16.0), Some(-3.0), Some(0.0)]);
        assert_eq!(report.delay_values_rounded, 3);
    }

    #[test]
    fn test_zero_variance_column_unchanged() {
        let df = df!["Passenger_Count" => [150i64, 150, 150]].unwrap();

        let (out, report, diagnostics) = treat(df.clone());

        assert!(out.equals(&df));
        assert_eq!(report.column("Passenger_Count").unwrap().upper_bound, None);
        assert_eq!(diagnostics.count(DiagnosticKind::UndefinedStatistic), 1);
    }

    #[test]
    fn test_missing_and_non_numeric_columns_skipped() {
        let df = df!["Flight_Distance" => ["far", "near"]].unwrap();

        let (out, report, diagnostics) = treat(df.clone());

        assert!(out.equals(&df));
        assert!(report.columns.is_empty());
        // Five configured columns are absent
        assert_eq!(diagnostics.count(DiagnosticKind::MissingColumn), 5);
        assert_eq!(diagnostics.count(DiagnosticKind::UndefinedStatistic), 1);
    }

    #[test]
    fn test_nulls_preserved() {
        let df = df!["Flight_Duration" => [Some(90.0), None, Some(120.0), Some(95.0)]].unwrap();

        let (df, _, _) = treat(df);

        assert_eq!(df.column("Flight_Duration").unwrap().null_count(), 1);
    }
}
