//! Column conversion functions for type coercion.
//!
//! Each converter either produces a complete column of the target dtype or
//! rejects the whole column, naming the first present value it could not
//! convert. Nulls always pass through.
//!
//! Floats headed for a discrete column are rounded half away from zero, so a
//! median of 0.5 imputed into a 0/1 flag column becomes 1.

use crate::types::ColumnKind;
use crate::utils::{is_numeric_dtype, parse_numeric_string};
use polars::prelude::*;

/// Why a column could not be converted.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConversionError {
    #[error("value '{value}' cannot be converted to {target}")]
    Rejected { value: String, target: ColumnKind },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl ConversionError {
    fn rejected(value: impl ToString, target: ColumnKind) -> Self {
        Self::Rejected {
            value: value.to_string(),
            target,
        }
    }
}

type Conversion = Result<Series, ConversionError>;

/// Convert a column to the dtype of `kind`.
pub(crate) fn convert(series: &Series, kind: ColumnKind) -> Conversion {
    match kind {
        ColumnKind::Continuous => to_continuous(series),
        ColumnKind::Discrete => to_discrete(series),
        ColumnKind::Categorical => to_categorical(series),
    }
}

/// Convert to Float64. Strings are parsed after stripping number formatting.
pub(crate) fn to_continuous(series: &Series) -> Conversion {
    match series.dtype() {
        DataType::String => {
            let ca = series.str()?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(ca.len());
            for opt_val in ca.into_iter() {
                match opt_val {
                    Some(val) => match parse_numeric_string(val) {
                        Some(parsed) => values.push(Some(parsed)),
                        None => return Err(ConversionError::rejected(val, ColumnKind::Continuous)),
                    },
                    None => values.push(None),
                }
            }
            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) || dtype == &DataType::Boolean => {
            Ok(series.strict_cast(&DataType::Float64)?)
        }
        dtype => Err(ConversionError::rejected(
            format!("<{}>", dtype),
            ColumnKind::Continuous,
        )),
    }
}

/// Convert to Int64. Fractional values are rounded to the nearest integer.
pub(crate) fn to_discrete(series: &Series) -> Conversion {
    match series.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let float_series = series.cast(&DataType::Float64)?;
            let values = round_all(float_series.f64()?.into_iter())?;
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::String => {
            let ca = series.str()?;
            let mut values: Vec<Option<i64>> = Vec::with_capacity(ca.len());
            for opt_val in ca.into_iter() {
                match opt_val {
                    Some(val) => {
                        let rounded = parse_numeric_string(val).and_then(round_to_i64);
                        match rounded {
                            Some(int_val) => values.push(Some(int_val)),
                            None => {
                                return Err(ConversionError::rejected(val, ColumnKind::Discrete));
                            }
                        }
                    }
                    None => values.push(None),
                }
            }
            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) || dtype == &DataType::Boolean => {
            Ok(series.strict_cast(&DataType::Int64)?)
        }
        dtype => Err(ConversionError::rejected(
            format!("<{}>", dtype),
            ColumnKind::Discrete,
        )),
    }
}

/// Render any primitive column as text.
pub(crate) fn to_categorical(series: &Series) -> Conversion {
    Ok(series.cast(&DataType::String)?)
}

fn round_all<I>(values: I) -> Result<Vec<Option<i64>>, ConversionError>
where
    I: Iterator<Item = Option<f64>>,
{
    values
        .map(|opt_val| match opt_val {
            Some(v) => round_to_i64(v)
                .map(Some)
                .ok_or_else(|| ConversionError::rejected(v, ColumnKind::Discrete)),
            None => Ok(None),
        })
        .collect()
}

/// Round half away from zero. `None` for NaN, infinities and values outside i64.
pub(crate) fn round_to_i64(value: f64) -> Option<i64> {
    let rounded = value.round();
    // i64::MAX is not representable as f64; its nearest f64 is 2^63, already out of range
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_value(result: Conversion) -> String {
        match result {
            Err(ConversionError::Rejected { value, .. }) => value,
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    // ========================================================================
    // to_continuous() tests
    // ========================================================================

    #[test]
    fn test_string_to_continuous() {
        let series = Series::new("price".into(), &[Some("$1,200.50"), None, Some("99")]);
        let result = to_continuous(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Float64);
        let ca = result.f64().unwrap();
        assert_eq!(ca.get(0), Some(1200.5));
        assert_eq!(ca.get(1), None);
        assert_eq!(ca.get(2), Some(99.0));
    }

    #[test]
    fn test_string_to_continuous_rejects_first_bad_value() {
        let series = Series::new("price".into(), &["100", "n/a-ish", "cheap"]);
        assert_eq!(rejected_value(to_continuous(&series)), "n/a-ish");
    }

    #[test]
    fn test_integer_to_continuous() {
        let series = Series::new("distance".into(), &[500i64, 1200]);
        let result = to_continuous(&series).unwrap();
        assert_eq!(result.dtype(), &DataType::Float64);
        assert_eq!(result.f64().unwrap().get(1), Some(1200.0));
    }

    // ========================================================================
    // to_discrete() tests
    // ========================================================================

    #[test]
    fn test_float_to_discrete_rounds() {
        let series = Series::new("delay".into(), &[Some(14.5), Some(-2.5), None, Some(3.2)]);
        let result = to_discrete(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Int64);
        let ca = result.i64().unwrap();
        assert_eq!(ca.get(0), Some(15));
        assert_eq!(ca.get(1), Some(-3));
        assert_eq!(ca.get(2), None);
        assert_eq!(ca.get(3), Some(3));
    }

    #[test]
    fn test_float_to_discrete_rounds_halves_away_from_zero() {
        // A flag column after median imputation of an even 0/1 split
        let series = Series::new("cancelled".into(), &[0.0, 1.0, 0.5, -0.5, 0.49]);
        let result = to_discrete(&series).unwrap();

        let values: Vec<Option<i64>> = result.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0), Some(1), Some(1), Some(-1), Some(0)]);
    }

    #[test]
    fn test_float_to_discrete_rejects_nan() {
        let series = Series::new("delay".into(), &[1.0, f64::NAN]);
        assert_eq!(rejected_value(to_discrete(&series)), "NaN");
    }

    #[test]
    fn test_boolean_to_discrete() {
        let series = Series::new("cancelled".into(), &[true, false, true]);
        let result = to_discrete(&series).unwrap();
        assert_eq!(result.dtype(), &DataType::Int64);
        assert_eq!(result.i64().unwrap().get(0), Some(1));
        assert_eq!(result.i64().unwrap().get(1), Some(0));
    }

    #[test]
    fn test_string_to_discrete() {
        let series = Series::new("passengers".into(), &["150", "151.6", "1,024"]);
        let result = to_discrete(&series).unwrap();
        let ca = result.i64().unwrap();
        assert_eq!(ca.get(0), Some(150));
        assert_eq!(ca.get(1), Some(152));
        assert_eq!(ca.get(2), Some(1024));

        let series = Series::new("passengers".into(), &["150", "full"]);
        assert_eq!(rejected_value(to_discrete(&series)), "full");
    }

    // ========================================================================
    // to_categorical() tests
    // ========================================================================

    #[test]
    fn test_numeric_to_categorical() {
        let series = Series::new("gate".into(), &[Some(12i64), None]);
        let result = to_categorical(&series).unwrap();
        assert_eq!(result.dtype(), &DataType::String);
        assert_eq!(result.str().unwrap().get(0), Some("12"));
        assert_eq!(result.null_count(), 1);
    }

    #[test]
    fn test_round_to_i64_bounds() {
        assert_eq!(round_to_i64(2.5), Some(3));
        assert_eq!(round_to_i64(-0.4), Some(0));
        assert_eq!(round_to_i64(f64::INFINITY), None);
        assert_eq!(round_to_i64(1e19), None);
    }
}
