//! Data cleaning stages for flight tables.
//!
//! This module provides:
//! - Removing exact duplicate rows
//! - Dropping the identifier column
//! - Type coercion to the expected schema

mod converters;
mod type_coercer;

pub use type_coercer::{CoercionReport, TypeCoercer};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::pipeline::{CleaningStage, PipelineStage};
use crate::utils::has_column;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

// =============================================================================
// Deduplication
// =============================================================================

/// What the deduplicator did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeduplicationReport {
    pub rows_before: usize,
    pub rows_removed: usize,
    /// False when deduplication was disabled.
    pub applied: bool,
}

/// Removes rows that exactly repeat an earlier row.
///
/// The first occurrence is kept and surviving rows keep their order, so
/// running the stage twice removes nothing the second time.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    enabled: bool,
}

impl Deduplicator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn deduplicate(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, DeduplicationReport)> {
        let before = df.height();
        if !self.enabled {
            diagnostics.info(
                PipelineStage::Deduplication,
                None,
                "Duplicate removal disabled, skipping",
            );
            return Ok((
                df,
                DeduplicationReport {
                    rows_before: before,
                    ..Default::default()
                },
            ));
        }

        let df = df
            .unique_stable(None, UniqueKeepStrategy::First, None)
            .context("Failed to remove duplicate rows")?;
        let removed = before - df.height();

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            diagnostics.info(
                PipelineStage::Deduplication,
                None,
                format!("Removed {} duplicate rows ({:.1}%)", removed, pct),
            );
        } else {
            diagnostics.info(PipelineStage::Deduplication, None, "No duplicate rows found");
        }

        Ok((
            df,
            DeduplicationReport {
                rows_before: before,
                rows_removed: removed,
                applied: true,
            },
        ))
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CleaningStage for Deduplicator {
    type Report = DeduplicationReport;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Deduplication
    }

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, DeduplicationReport)> {
        self.deduplicate(df, diagnostics)
    }
}

// =============================================================================
// Column Pruning
// =============================================================================

/// What the pruner did to the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruningReport {
    /// The identifier column that was dropped, if one was found.
    pub removed: Option<String>,
}

/// Drops the flight identifier column.
///
/// Variants are checked in priority order and only the first match is
/// dropped, even if the table carries several spellings.
#[derive(Debug, Clone)]
pub struct ColumnPruner {
    variants: Vec<String>,
}

impl ColumnPruner {
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// The variant that would be dropped from `df`, if any.
    pub fn find_identifier(&self, df: &DataFrame) -> Option<&str> {
        self.variants
            .iter()
            .map(String::as_str)
            .find(|variant| has_column(df, variant))
    }

    pub fn prune(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, PruningReport)> {
        let Some(identifier) = self.find_identifier(&df).map(str::to_string) else {
            diagnostics.push(
                PipelineStage::ColumnPruning,
                DiagnosticKind::MissingColumn,
                None,
                format!(
                    "No identifier column found (checked: {}), nothing dropped",
                    self.variants.join(", ")
                ),
            );
            return Ok((df, PruningReport::default()));
        };

        debug!("Dropping identifier column '{}'", identifier);
        let df = df
            .drop(&identifier)
            .with_context(|| format!("Failed to drop column '{}'", identifier))?;
        diagnostics.info(
            PipelineStage::ColumnPruning,
            Some(&identifier),
            format!("Dropped identifier column '{}'", identifier),
        );

        Ok((
            df,
            PruningReport {
                removed: Some(identifier),
            },
        ))
    }
}

impl Default for ColumnPruner {
    fn default() -> Self {
        Self::new(crate::config::IDENTIFIER_VARIANTS)
    }
}

impl CleaningStage for ColumnPruner {
    type Report = PruningReport;

    fn stage(&self) -> PipelineStage {
        PipelineStage::ColumnPruning
    }

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> Result<(DataFrame, PruningReport)> {
        self.prune(df, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flights_with_duplicates() -> DataFrame {
        df![
            "Airline" => ["Delta", "United", "Delta", "Delta", "United"],
            "Flight_Distance" => [500.0, 700.0, 500.0, 900.0, 700.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_deduplicate_keeps_first_in_order() {
        let mut diagnostics = Diagnostics::new();
        let (df, report) = Deduplicator::default()
            .deduplicate(flights_with_duplicates(), &mut diagnostics)
            .unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(report.rows_removed, 2);
        let airlines: Vec<_> = df.column("Airline").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(airlines, vec![Some("Delta"), Some("United"), Some("Delta")]);
        let distances: Vec<_> = df
            .column("Flight_Distance")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(distances, vec![Some(500.0), Some(700.0), Some(900.0)]);
        assert!(diagnostics.records()[0].message.contains("Removed 2 duplicate rows (40.0%)"));
    }

    #[test]
    fn test_deduplicate_idempotent() {
        let dedup = Deduplicator::default();
        let mut diagnostics = Diagnostics::new();
        let (once, _) = dedup
            .deduplicate(flights_with_duplicates(), &mut diagnostics)
            .unwrap();
        let (twice, report) = dedup.deduplicate(once.clone(), &mut diagnostics).unwrap();

        assert!(once.equals(&twice));
        assert_eq!(report.rows_removed, 0);
        assert_eq!(diagnostics.records()[1].message, "No duplicate rows found");
    }

    #[test]
    fn test_deduplicate_disabled() {
        let mut diagnostics = Diagnostics::new();
        let (df, report) = Deduplicator::new(false)
            .deduplicate(flights_with_duplicates(), &mut diagnostics)
            .unwrap();

        assert_eq!(df.height(), 5);
        assert!(!report.applied);
        assert!(diagnostics.records()[0].message.contains("disabled"));
    }

    #[test]
    fn test_prune_drops_only_highest_priority_variant() {
        let df = df![
            "flight_id" => ["a1", "a2"],
            "Flight_ID" => ["F1", "F2"],
            "Airline" => ["Delta", "United"],
        ]
        .unwrap();

        let mut diagnostics = Diagnostics::new();
        let (df, report) = ColumnPruner::default().prune(df, &mut diagnostics).unwrap();

        assert_eq!(report.removed.as_deref(), Some("Flight_ID"));
        assert!(has_column(&df, "flight_id"));
        assert!(!has_column(&df, "Flight_ID"));
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_prune_lower_priority_variant() {
        let df = df![
            "Flight Id" => ["F1", "F2"],
            "Airline" => ["Delta", "United"],
        ]
        .unwrap();

        let mut diagnostics = Diagnostics::new();
        let (df, report) = ColumnPruner::default().prune(df, &mut diagnostics).unwrap();

        assert_eq!(report.removed.as_deref(), Some("Flight Id"));
        assert_eq!(df.width(), 1);
    }

    #[test]
    fn test_prune_without_identifier() {
        let df = df!["Airline" => ["Delta", "United"]].unwrap();

        let mut diagnostics = Diagnostics::new();
        let (out, report) = ColumnPruner::default()
            .prune(df.clone(), &mut diagnostics)
            .unwrap();

        assert!(out.equals(&df));
        assert_eq!(report.removed, None);
        assert_eq!(diagnostics.count(DiagnosticKind::MissingColumn), 1);
    }
}
