//! Configuration for the flight cleaning pipeline.
//!
//! The defaults carry the pipeline's embedded tables: the expected schema,
//! the identifier column variants and the outlier column list. They are
//! plain data so a caller can override any of them through the builder, but
//! nothing here reads files or environment variables.

use crate::types::{ColumnKind, SchemaEntry};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier column spellings, highest priority first.
pub const IDENTIFIER_VARIANTS: [&str; 8] = [
    "Flight_ID",
    "Flight ID",
    "FlightID",
    "flight_id",
    "flight id",
    "flightid",
    "FLIGHT_ID",
    "Flight Id",
];

/// Numeric columns inspected by the outlier treater, in processing order.
pub const OUTLIER_COLUMNS: [&str; 6] = [
    "Flight_Distance",
    "Flight_Duration",
    "Passenger_Count",
    "Load_Factor",
    "Delay_Minutes",
    "Ticket_Price",
];

/// Seat load fraction; capped at [`DEFAULT_LOAD_UPPER_BOUND`].
pub const LOAD_COLUMN: &str = "Load_Factor";

/// Delay duration; rounded to whole minutes.
pub const DELAY_COLUMN: &str = "Delay_Minutes";

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
pub const DEFAULT_CLAMP_SIGMA: f64 = 3.0;
pub const DEFAULT_LOAD_UPPER_BOUND: f64 = 1.0;
pub const DEFAULT_OUTPUT_PATH: &str = "outputs/cleaned_flights.csv";

/// Target kind for every column the pipeline knows about.
pub static EXPECTED_SCHEMA: Lazy<Vec<SchemaEntry>> = Lazy::new(|| {
    use ColumnKind::*;
    [
        ("Airline", Categorical),
        ("Origin_Airport", Categorical),
        ("Destination_Airport", Categorical),
        ("Aircraft_Type", Categorical),
        ("Scheduled_Departure_Time", Discrete),
        ("Flight_Distance", Continuous),
        ("Flight_Duration", Continuous),
        ("Passenger_Count", Discrete),
        ("Load_Factor", Continuous),
        ("Delay_Minutes", Discrete),
        ("Ticket_Price", Continuous),
        ("Flight_Cancelled", Discrete),
    ]
    .into_iter()
    .map(|(column, kind)| SchemaEntry::new(column, kind))
    .collect()
});

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to override individual settings.
///
/// # Example
///
/// ```rust,ignore
/// use flight_cleaning::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_path("results/flights.csv")
///     .z_threshold(3.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where the cleaned CSV is written.
    /// Default: "outputs/cleaned_flights.csv"
    pub output_path: PathBuf,

    /// Whether to write the cleaned table at all.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write a JSON report next to the CSV.
    /// Default: false
    pub generate_report: bool,

    /// Whether the deduplication stage runs.
    /// Default: true
    pub remove_duplicates: bool,

    /// Absolute standard score above which a value is reported as an outlier.
    /// Default: 3.0
    pub z_threshold: f64,

    /// Width of the general clamp interval in standard deviations.
    /// Default: 3.0
    pub clamp_sigma: f64,

    /// Upper bound applied to the load column.
    /// Default: 1.0
    pub load_upper_bound: f64,

    /// Identifier spellings checked by the column pruner, in priority order.
    pub identifier_variants: Vec<String>,

    /// Columns handled by the outlier treater, in order.
    pub outlier_columns: Vec<String>,

    /// Column clamped to `load_upper_bound`.
    pub load_column: String,

    /// Column rounded to the nearest integer.
    pub delay_column: String,

    /// Target kind per column for the type coercer.
    pub expected_schema: Vec<SchemaEntry>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            save_to_disk: true,
            generate_report: false,
            remove_duplicates: true,
            z_threshold: DEFAULT_Z_THRESHOLD,
            clamp_sigma: DEFAULT_CLAMP_SIGMA,
            load_upper_bound: DEFAULT_LOAD_UPPER_BOUND,
            identifier_variants: IDENTIFIER_VARIANTS.iter().map(|s| s.to_string()).collect(),
            outlier_columns: OUTLIER_COLUMNS.iter().map(|s| s.to_string()).collect(),
            load_column: LOAD_COLUMN.to_string(),
            delay_column: DELAY_COLUMN.to_string(),
            expected_schema: EXPECTED_SCHEMA.clone(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("z_threshold", self.z_threshold),
            ("clamp_sigma", self.clamp_sigma),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::InvalidMultiplier {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.load_upper_bound.is_finite() {
            return Err(ConfigValidationError::InvalidBound(self.load_upper_bound));
        }

        if self.save_to_disk && self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyOutputPath);
        }

        Ok(())
    }

    /// Expected kind for a column, if the schema names it.
    pub fn expected_kind(&self, column: &str) -> Option<ColumnKind> {
        self.expected_schema
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.kind)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be a positive finite number)")]
    InvalidMultiplier { field: String, value: f64 },

    #[error("Invalid load upper bound: {0} (must be finite)")]
    InvalidBound(f64),

    #[error("Output path must not be empty when saving to disk")]
    EmptyOutputPath,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    output_path: Option<PathBuf>,
    save_to_disk: Option<bool>,
    generate_report: Option<bool>,
    remove_duplicates: Option<bool>,
    z_threshold: Option<f64>,
    clamp_sigma: Option<f64>,
    load_upper_bound: Option<f64>,
    identifier_variants: Option<Vec<String>>,
    outlier_columns: Option<Vec<String>>,
    load_column: Option<String>,
    delay_column: Option<String>,
    expected_schema: Option<Vec<SchemaEntry>>,
}

impl PipelineConfigBuilder {
    /// Set the path the cleaned CSV is written to.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Enable or disable writing the cleaned table.
    ///
    /// When false, the result is kept in memory only.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the JSON report written next to the CSV.
    pub fn generate_report(mut self, generate: bool) -> Self {
        self.generate_report = Some(generate);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Set the standard score threshold used when reporting outliers.
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = Some(threshold);
        self
    }

    /// Set the clamp width in standard deviations.
    pub fn clamp_sigma(mut self, sigma: f64) -> Self {
        self.clamp_sigma = Some(sigma);
        self
    }

    /// Set the cap applied to the load column.
    pub fn load_upper_bound(mut self, bound: f64) -> Self {
        self.load_upper_bound = Some(bound);
        self
    }

    pub fn identifier_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier_variants = Some(variants.into_iter().map(Into::into).collect());
        self
    }

    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn load_column(mut self, column: impl Into<String>) -> Self {
        self.load_column = Some(column.into());
        self
    }

    pub fn delay_column(mut self, column: impl Into<String>) -> Self {
        self.delay_column = Some(column.into());
        self
    }

    pub fn expected_schema(mut self, schema: Vec<SchemaEntry>) -> Self {
        self.expected_schema = Some(schema);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            output_path: self.output_path.unwrap_or(defaults.output_path),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
            generate_report: self.generate_report.unwrap_or(defaults.generate_report),
            remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
            z_threshold: self.z_threshold.unwrap_or(defaults.z_threshold),
            clamp_sigma: self.clamp_sigma.unwrap_or(defaults.clamp_sigma),
            load_upper_bound: self.load_upper_bound.unwrap_or(defaults.load_upper_bound),
            identifier_variants: self
                .identifier_variants
                .unwrap_or(defaults.identifier_variants),
            outlier_columns: self.outlier_columns.unwrap_or(defaults.outlier_columns),
            load_column: self.load_column.unwrap_or(defaults.load_column),
            delay_column: self.delay_column.unwrap_or(defaults.delay_column),
            expected_schema: self.expected_schema.unwrap_or(defaults.expected_schema),
        };

        config.validate()?;
        Ok(config)
    }
}
