//! Shared utilities for the cleaning stages.
//!
//! Statistics here work on plain `f64` slices so their edge cases (empty
//! input, a single value, zero variance) can be tested without building a
//! DataFrame. The Series helpers are thin adapters around them.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Owned column names of a DataFrame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Whether a DataFrame has a column with this exact name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

// =============================================================================
// Statistics
// =============================================================================

/// Median of a slice. `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean. `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample mean and standard deviation (N-1 divisor).
///
/// `None` when fewer than two values are present or the deviation is zero
/// or not finite: a standard score is undefined in all of those cases.
pub fn sample_moments(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let std = (sum_sq / (values.len() - 1) as f64).sqrt();
    if std.is_finite() && std > 0.0 {
        Some((mean, std))
    } else {
        None
    }
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Non-null values of a numeric Series as `f64`, in row order.
pub fn present_f64_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    let ca = float_series.f64()?;
    Ok(ca.into_iter().flatten().collect())
}

/// Most frequent non-null value of any Series, compared by its text form.
///
/// Returns the rendered value, its count, and the row index where it first
/// occurs. Ties go to the value seen first in row order.
pub fn stable_mode(series: &Series) -> PolarsResult<Option<(String, usize, usize)>> {
    let str_series = series.cast(&DataType::String)?;
    let ca = str_series.str()?;

    // value -> (count, first index)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in ca.into_iter().enumerate() {
        if let Some(value) = value {
            counts.entry(value).or_insert((0, idx)).0 += 1;
        }
    }

    let best = counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, (count, first))| (value.to_string(), count, first));

    Ok(best)
}

/// Fill null values in a numeric Series with a value, producing Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = float_series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values with the value found at `index`, keeping the dtype.
pub fn fill_nulls_from_index(series: &Series, index: usize) -> PolarsResult<Series> {
    let fill = series.new_from_index(index, series.len());
    let present = series.is_not_null();
    series.zip_with(&present, &fill)
}

// =============================================================================
// Tests
// =============================================================================
