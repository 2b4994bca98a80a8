//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning stages.

use super::CleaningStage;
use crate::cleaner::{ColumnPruner, Deduplicator, TypeCoercer};
use crate::config::PipelineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::io;
use crate::pipeline::outliers::OutlierTreater;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::ReportGenerator;
use crate::types::{CleaningResult, CleaningSummary, StageReports};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The flight data cleaning pipeline.
///
/// Runs five stages in a fixed order, each consuming the table produced by
/// the previous one: imputation, deduplication, identifier pruning, outlier
/// treatment and type coercion. The cleaned table is then written to disk
/// unless saving is disabled.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use flight_cleaning::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().output_path("outputs/clean.csv").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run_file("data/flights.csv")?;
///
/// for diagnostic in &result.diagnostics {
///     println!("{}", diagnostic);
/// }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    imputer: StatisticalImputer,
    deduplicator: Deduplicator,
    pruner: ColumnPruner,
    outlier_treater: OutlierTreater,
    coercer: TypeCoercer,
}

// Ensure Pipeline is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and clean it.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::SourceUnavailable`](crate::CleaningError::SourceUnavailable) if the file cannot be
    /// loaded. No stage runs in that case.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<CleaningResult> {
        let path = path.as_ref();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));

        let df = match io::load_csv(path) {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                return Err(e);
            }
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        Ok(self.clean(df, Some(path)))
    }

    /// Clean an in-memory table.
    ///
    /// Missing columns, undefined statistics, failed coercions, failed
    /// stages and failed writes are reported as diagnostics on the result.
    pub fn process(&self, df: DataFrame) -> CleaningResult {
        self.clean(df, None)
    }

    fn clean(&self, df: DataFrame, input: Option<&Path>) -> CleaningResult {
        let result = self.process_internal(df, input);

        let failed_stages = result
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::StageFailure)
            .count();
        let message = if failed_stages == 0 {
            "Pipeline completed successfully".to_string()
        } else {
            format!("Pipeline completed with {} failed stages", failed_stages)
        };
        self.report_progress(ProgressUpdate::complete(message));

        result
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Run one stage, bracketing it with progress updates.
    ///
    /// If the stage fails, a [`DiagnosticKind::StageFailure`] is recorded and
    /// the table it received is returned unchanged with an empty report.
    fn run_stage<S: CleaningStage>(
        &self,
        stage: &S,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> (DataFrame, S::Report) {
        let kind = stage.stage();
        info!("{}...", kind.display_name());
        self.report_progress(ProgressUpdate::new(
            kind,
            0.0,
            format!("{}...", kind.display_name()),
        ));

        // Stages consume their input; columns are shared, so this copy is shallow
        let previous = df.clone();
        let (df, report, message) = match stage.apply(df, diagnostics) {
            Ok((df, report)) => (df, report, format!("{} complete", kind.display_name())),
            Err(e) => {
                diagnostics.stage_failure(
                    kind,
                    format!(
                        "{} failed, keeping the table from the previous stage: {:#}",
                        kind.display_name(),
                        e
                    ),
                );
                (
                    previous,
                    S::Report::default(),
                    format!("{} failed", kind.display_name()),
                )
            }
        };

        self.report_progress(ProgressUpdate::new(kind, 1.0, message));
        (df, report)
    }

    fn process_internal(&self, df: DataFrame, input: Option<&Path>) -> CleaningResult {
        let start_time = Instant::now();
        info!("Starting cleaning pipeline...");

        let mut diagnostics = Diagnostics::new();
        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        let (df, imputation) = self.run_stage(&self.imputer, df, &mut diagnostics);
        let (df, deduplication) = self.run_stage(&self.deduplicator, df, &mut diagnostics);
        let (df, pruning) = self.run_stage(&self.pruner, df, &mut diagnostics);
        let (df, outliers) = self.run_stage(&self.outlier_treater, df, &mut diagnostics);
        let (mut df, coercion) = self.run_stage(&self.coercer, df, &mut diagnostics);

        summary.cells_imputed = imputation.cells_imputed;
        summary.columns_imputed = imputation.columns_imputed;
        summary.duplicates_removed = deduplication.rows_removed;
        summary.pruned_column = pruning.removed.clone();
        summary.outliers_detected = outliers.outliers_detected;
        summary.values_clamped = outliers.values_clamped;
        summary.columns_coerced = coercion.coerced.len();
        summary.coercion_failures = coercion.failed.len();
        summary.rows_after = df.height();
        summary.columns_after = df.width();

        let stages = StageReports {
            imputation,
            deduplication,
            pruning,
            outliers,
            coercion,
        };

        let output_path = self
            .config
            .save_to_disk
            .then(|| self.config.output_path.clone());
        let persisted = match &output_path {
            Some(path) => self.persist(&mut df, path, &mut diagnostics),
            None => {
                info!("Saving disabled, keeping cleaned table in memory");
                false
            }
        };

        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        let mut result = CleaningResult {
            data: df,
            diagnostics: Vec::new(),
            summary,
            stages,
            output_path,
            persisted,
        };

        if self.config.generate_report
            && let Some(path) = &result.output_path
        {
            let report_path = ReportGenerator::report_path(path);
            result.diagnostics = diagnostics.records().to_vec();
            let report = ReportGenerator::build_report(input, &result);
            if let Err(e) = ReportGenerator::write_report(&report, &report_path) {
                diagnostics.persistence_failure(format!(
                    "Could not write report '{}': {:#}",
                    report_path.display(),
                    e
                ));
            }
        }

        result.diagnostics = diagnostics.into_records();

        info!(
            "Pipeline finished in {} ms: {} rows x {} columns",
            result.summary.duration_ms, result.summary.rows_after, result.summary.columns_after
        );
        result
    }

    /// Write the cleaned table. A failure is recorded, never raised.
    fn persist(&self, df: &mut DataFrame, path: &Path, diagnostics: &mut Diagnostics) -> bool {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Persistence,
            0.0,
            format!("Saving {}...", path.display()),
        ));

        match io::write_csv(df, path) {
            Ok(()) => {
                diagnostics.info(
                    PipelineStage::Persistence,
                    None,
                    format!("Saved cleaned data to {}", path.display()),
                );
                self.report_progress(ProgressUpdate::new(
                    PipelineStage::Persistence,
                    1.0,
                    "Output saved",
                ));
                true
            }
            Err(e) => {
                diagnostics.persistence_failure(format!(
                    "Could not save cleaned data to '{}': {:#}",
                    path.display(),
                    e
                ));
                false
            }
        }
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use flight_cleaning::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns [`CleaningError::InvalidConfig`](crate::CleaningError::InvalidConfig) if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            imputer: StatisticalImputer,
            deduplicator: Deduplicator::new(config.remove_duplicates),
            pruner: ColumnPruner::new(config.identifier_variants.iter().cloned()),
            outlier_treater: OutlierTreater::from_config(&config),
            coercer: TypeCoercer::new(config.expected_schema.clone()),
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}
