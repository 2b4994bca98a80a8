//! Custom error types for the flight cleaning pipeline.
//!
//! Only conditions that stop the pipeline live here. Recoverable
//! irregularities (missing columns, degenerate statistics, failed coercions,
//! failed stages, failed writes) are recorded as
//! [`crate::diagnostics::Diagnostic`]s instead.
//!
//! Errors are serializable so the CLI can emit them as JSON.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// The input table could not be obtained.
    #[error("Source '{path}' is unavailable: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// The pipeline was built with an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),
}

impl CleaningError {
    /// Build a [`CleaningError::SourceUnavailable`] from a path and any displayable cause.
    pub fn source_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        CleaningError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// Check if this error means the input never reached the first stage.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CleaningError::source_unavailable("flights.csv", "not found").error_code(),
            "SOURCE_UNAVAILABLE"
        );
        assert_eq!(
            CleaningError::from(ConfigValidationError::EmptyOutputPath).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_is_source_unavailable() {
        let missing = CleaningError::source_unavailable("flights.csv", "not found");
        assert!(missing.is_source_unavailable());

        let invalid = CleaningError::from(ConfigValidationError::InvalidBound(f64::NAN));
        assert!(!invalid.is_source_unavailable());
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::source_unavailable("flights.csv", "not found");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SOURCE_UNAVAILABLE"));
        assert!(json.contains("flights.csv"));
    }

    #[test]
    fn test_invalid_config_message() {
        let error = CleaningError::from(ConfigValidationError::InvalidMultiplier {
            field: "z_threshold".to_string(),
            value: -1.0,
        });
        let message = error.to_string();
        assert!(message.starts_with("Invalid configuration"));
        assert!(message.contains("z_threshold"));
    }
}
