//! `SqlValue` and the `FromValue` extraction trait

use std::fmt;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// The value does not fit in the requested integer type
    OutOfRange(String),
    /// The row has no column at the requested index
    ColumnIndex { index: usize, len: usize },
}

impl fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueExtractionError::OutOfRange(msg) => write!(f, "Value out of range: {msg}"),
            ValueExtractionError::ColumnIndex { index, len } => {
                write!(f, "Column index {index} out of bounds for row of {len} column(s)")
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// A dialect-neutral SQL value
///
/// Used both for statement parameters and for the columns of a [`Row`](crate::Row).
/// Drivers translate it to and from their native representations.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
}

impl SqlValue {
    /// Short type name used in mismatch errors
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Text(_) => "text",
            SqlValue::Blob(_) => "blob",
            SqlValue::Bool(_) => "bool",
        }
    }

    /// Returns `true` for `SqlValue::Null`
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Conversion from a column value into a Rust type
pub trait FromValue: Sized {
    /// Convert the value, failing on null, mismatched type or overflow.
    ///
    /// # Errors
    ///
    /// Returns `ValueExtractionError` when the value cannot be represented as `Self`.
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError>;
}

fn mismatch(expected: &'static str, value: &SqlValue) -> ValueExtractionError {
    if value.is_null() {
        ValueExtractionError::NullValue
    } else {
        ValueExtractionError::TypeMismatch {
            expected,
            actual: value.type_name(),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        match value {
            SqlValue::Integer(v) => Ok(*v),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            other => Err(mismatch("integer", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| ValueExtractionError::OutOfRange(format!("{wide} does not fit in i32")))
    }
}

impl FromValue for u64 {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        let wide = i64::from_value(value)?;
        u64::try_from(wide)
            .map_err(|_| ValueExtractionError::OutOfRange(format!("{wide} is negative")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        match value {
            SqlValue::Real(v) => Ok(*v),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Integer(v) => Ok(*v as f64),
            other => Err(mismatch("real", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            // SQLite has no boolean storage class
            SqlValue::Integer(v) => Ok(*v != 0),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        match value {
            SqlValue::Blob(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch("blob", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &SqlValue) -> Result<Self, ValueExtractionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_extraction() {
        assert_eq!(i64::from_value(&SqlValue::Integer(42)), Ok(42));
        assert_eq!(i32::from_value(&SqlValue::Integer(-7)), Ok(-7));
        assert_eq!(u64::from_value(&SqlValue::Integer(7)), Ok(7));
    }

    #[test]
    fn test_null_is_reported_distinctly() {
        assert_eq!(
            i64::from_value(&SqlValue::Null),
            Err(ValueExtractionError::NullValue)
        );
        assert_eq!(Option::<i64>::from_value(&SqlValue::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(&SqlValue::Text("x".into())),
            Ok(Some("x".to_string()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = String::from_value(&SqlValue::Integer(1)).unwrap_err();
        assert_eq!(
            err,
            ValueExtractionError::TypeMismatch {
                expected: "text",
                actual: "integer"
            }
        );
        assert!(err.to_string().contains("expected text"));
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            u64::from_value(&SqlValue::Integer(-1)),
            Err(ValueExtractionError::OutOfRange(_))
        ));
        assert!(matches!(
            i32::from_value(&SqlValue::Integer(i64::MAX)),
            Err(ValueExtractionError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_sqlite_style_booleans() {
        assert_eq!(bool::from_value(&SqlValue::Integer(1)), Ok(true));
        assert_eq!(bool::from_value(&SqlValue::Integer(0)), Ok(false));
        assert_eq!(bool::from_value(&SqlValue::Bool(true)), Ok(true));
    }

    #[test]
    fn test_option_conversion_into_value() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("a")), SqlValue::Text("a".to_string()));
    }
}
