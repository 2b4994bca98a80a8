//! Diagnostics collected while the pipeline runs.
//!
//! Every stage receives a `&mut Diagnostics` and records one entry per
//! decision it makes (which column was filled and with what, which column
//! was skipped and why). Each entry is also emitted through `tracing`, so a
//! console subscriber sees the same status lines the caller gets back.

use crate::pipeline::PipelineStage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A normal status line (counts, fill values, bounds).
    Info,
    /// An expected column is absent; the stage skipped it.
    MissingColumn,
    /// A median, mode or standard score could not be computed.
    UndefinedStatistic,
    /// A column could not be converted to its expected kind.
    CoercionFailure,
    /// The cleaned table could not be written.
    PersistenceFailure,
    /// A stage stopped on an unexpected table error; its changes were discarded.
    StageFailure,
}

impl DiagnosticKind {
    /// Whether this kind signals something the caller may want to act on.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::Info)
    }
}

/// One advisory status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: PipelineStage,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage.display_name(), self.message)
    }
}

/// Ordered collector of [`Diagnostic`]s.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log.
    pub fn push(
        &mut self,
        stage: PipelineStage,
        kind: DiagnosticKind,
        column: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        if kind.is_warning() {
            warn!("{}", message);
        } else {
            info!("{}", message);
        }
        self.records.push(Diagnostic {
            stage,
            kind,
            column: column.map(str::to_string),
            message,
        });
    }

    pub fn info(&mut self, stage: PipelineStage, column: Option<&str>, message: impl Into<String>) {
        self.push(stage, DiagnosticKind::Info, column, message);
    }

    pub fn missing_column(&mut self, stage: PipelineStage, column: &str) {
        self.push(
            stage,
            DiagnosticKind::MissingColumn,
            Some(column),
            format!("Column '{}' not found, skipping", column),
        );
    }

    pub fn undefined_statistic(
        &mut self,
        stage: PipelineStage,
        column: &str,
        message: impl Into<String>,
    ) {
        self.push(stage, DiagnosticKind::UndefinedStatistic, Some(column), message);
    }

    pub fn coercion_failure(
        &mut self,
        stage: PipelineStage,
        column: &str,
        message: impl Into<String>,
    ) {
        self.push(stage, DiagnosticKind::CoercionFailure, Some(column), message);
    }

    pub fn stage_failure(&mut self, stage: PipelineStage, message: impl Into<String>) {
        self.push(stage, DiagnosticKind::StageFailure, None, message);
    }

    pub fn persistence_failure(&mut self, message: impl Into<String>) {
        self.push(
            PipelineStage::Persistence,
            DiagnosticKind::PersistenceFailure,
            None,
            message,
        );
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Diagnostic> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.records.iter().filter(|d| d.kind == kind).count()
    }

    /// Records emitted by one stage, in order.
    pub fn for_stage(&self, stage: PipelineStage) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info(PipelineStage::Imputation, Some("Airline"), "first");
        diagnostics.missing_column(PipelineStage::ColumnPruning, "Flight_ID");
        diagnostics.info(PipelineStage::Imputation, None, "third");

        let messages: Vec<&str> = diagnostics
            .records()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages[0], "first");
        assert!(messages[1].contains("Flight_ID"));
        assert_eq!(messages[2], "third");
    }

    #[test]
    fn test_count_and_for_stage() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.missing_column(PipelineStage::OutlierTreatment, "Load_Factor");
        diagnostics.missing_column(PipelineStage::TypeCoercion, "Airline");
        diagnostics.coercion_failure(PipelineStage::TypeCoercion, "Ticket_Price", "bad value");

        assert_eq!(diagnostics.count(DiagnosticKind::MissingColumn), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::CoercionFailure), 1);
        assert_eq!(diagnostics.for_stage(PipelineStage::TypeCoercion).count(), 2);
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_diagnostic_serialization() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.undefined_statistic(
            PipelineStage::Imputation,
            "Ticket_Price",
            "no present values",
        );
        let json = serde_json::to_string(&diagnostics.records()[0]).unwrap();
        assert!(json.contains("\"kind\":\"undefined_statistic\""));
        assert!(json.contains("\"stage\":\"imputation\""));
        assert!(json.contains("\"column\":\"Ticket_Price\""));
    }
}
