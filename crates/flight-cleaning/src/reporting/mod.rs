//! Report generation module.
//!
//! Turns a [`crate::CleaningResult`] into a serializable [`CleaningReport`],
//! suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - A JSON file next to the cleaned CSV (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use flight_cleaning::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(Some(input_path), &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod generator;

pub use generator::{CleaningReport, ColumnDescription, ReportGenerator};
