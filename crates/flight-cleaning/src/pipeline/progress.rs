//! Progress reporting for the cleaning pipeline.
//!
//! The pipeline reports the start and end of every stage to an optional
//! [`ProgressReporter`]. Reporting is advisory: nothing a reporter does can
//! change the cleaned table.
//!
//! # Example
//!
//! ```rust,ignore
//! use flight_cleaning::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df);
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Obtaining the input table
    Loading,
    /// Filling missing cells
    Imputation,
    /// Removing duplicate rows
    Deduplication,
    /// Dropping the flight identifier column
    ColumnPruning,
    /// Reporting and clamping outliers
    OutlierTreatment,
    /// Enforcing the expected schema
    TypeCoercion,
    /// Writing the cleaned table
    Persistence,
    /// Pipeline completed
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Stages that carry work, in execution order.
    pub const WORK_STAGES: [PipelineStage; 7] = [
        Self::Loading,
        Self::Imputation,
        Self::Deduplication,
        Self::ColumnPruning,
        Self::OutlierTreatment,
        Self::TypeCoercion,
        Self::Persistence,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Imputation => "Imputing Values",
            Self::Deduplication => "Removing Duplicates",
            Self::ColumnPruning => "Pruning Columns",
            Self::OutlierTreatment => "Treating Outliers",
            Self::TypeCoercion => "Coercing Types",
            Self::Persistence => "Saving Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run attributed to this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.05,
            Self::Imputation => 0.20,
            Self::Deduplication => 0.10,
            Self::ColumnPruning => 0.05,
            Self::OutlierTreatment => 0.30,
            Self::TypeCoercion => 0.20,
            Self::Persistence => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    ///
    /// Accumulated from the weights of the preceding stages, so a stage's end
    /// (`base + weight`) is exactly the next stage's base.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            _ => {
                let mut base = 0.0;
                for stage in Self::WORK_STAGES {
                    if stage == *self {
                        break;
                    }
                    base += stage.weight();
                }
                base
            }
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates during cleaning.
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// moved to a worker thread.
pub trait ProgressReporter: Send + Sync {
    /// Called at the start and end of each stage.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
