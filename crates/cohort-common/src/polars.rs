//! Polars value conversion and typed, null-aware column extraction.

use polars::prelude::{AnyValue, Column, DataType, PolarsResult};

/// Converts an `AnyValue` to `i64`, returning `None` for non-integer or null values.
///
/// Handles integer types, floating-point types (truncated), and string parsing.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::Float32(v) if v.is_finite() => Some(v as i64),
        AnyValue::Float64(v) if v.is_finite() => Some(v as i64),
        AnyValue::String(s) => parse_i64(s),
        AnyValue::StringOwned(s) => parse_i64(&s),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
///
/// Integral float text such as `"2.0"` is accepted.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Returns true for `Float32` and `Float64` columns.
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Returns true for integer and floating-point columns.
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

/// Reads a column as trimmed strings, with nulls and blank cells as `None`.
pub fn column_strings(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let as_str = column.cast(&DataType::String)?;
    let chunked = as_str.str()?;
    Ok(chunked
        .iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|trimmed| !trimmed.is_empty())
                .map(str::to_string)
        })
        .collect())
}

/// Reads a column as `f64`, with nulls, NaN and unparseable cells as `None`.
pub fn column_f64(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let as_float = column.cast(&DataType::Float64)?;
    let chunked = as_float.f64()?;
    Ok(chunked
        .iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    #[test]
    fn test_any_to_i64() {
        assert_eq!(any_to_i64(AnyValue::Int32(1)), Some(1));
        assert_eq!(any_to_i64(AnyValue::Float64(3.9)), Some(3)); // truncated
        assert_eq!(any_to_i64(AnyValue::Float64(f64::NAN)), None);
        assert_eq!(any_to_i64(AnyValue::String("1.0")), Some(1));
        assert_eq!(any_to_i64(AnyValue::String("1.5")), None);
    }

    #[test]
    fn test_column_strings_blank_is_none() {
        let column = Series::new("A".into(), &["x", " ", "y "]).into_column();
        let values = column_strings(&column).unwrap();
        assert_eq!(
            values,
            vec![Some("x".to_string()), None, Some("y".to_string())]
        );
    }

    #[test]
    fn test_column_f64_nan_is_none() {
        let column = Series::new("A".into(), &[Some(1.0), None, Some(f64::NAN)]).into_column();
        let values = column_f64(&column).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_dtype_predicates() {
        assert!(is_float_dtype(&DataType::Float64));
        assert!(!is_float_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(!is_numeric_dtype(&DataType::String));
    }
}
