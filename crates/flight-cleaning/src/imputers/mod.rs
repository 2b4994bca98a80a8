//! Imputation module for handling missing values.
//!
//! Numeric columns are filled with their median and all other columns with
//! their most frequent value.

mod statistical;

pub use statistical::{FillPolicy, ImputationReport, StatisticalImputer};
