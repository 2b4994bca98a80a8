//! Pipeline module.
//!
//! This module provides the cleaning pipeline, the stage abstraction it
//! composes, and progress reporting.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{ColumnOutlierReport, OutlierReport, OutlierTreater};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};

use crate::diagnostics::Diagnostics;
use polars::prelude::*;

/// One step of the cleaning pipeline.
///
/// A stage consumes the table produced by the previous stage and returns the
/// table that supersedes it, together with a stage-specific report. Status
/// lines go to `diagnostics`; only unexpected table failures are errors.
pub trait CleaningStage: Send + Sync {
    /// Counters describing what the stage did.
    type Report: std::fmt::Debug + Default;

    /// Which pipeline stage this is, for progress and diagnostics.
    fn stage(&self) -> PipelineStage;

    fn apply(
        &self,
        df: DataFrame,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<(DataFrame, Self::Report)>;
}
