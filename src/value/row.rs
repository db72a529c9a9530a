//! Owned result rows

use crate::value::{FromValue, SqlValue, ValueExtractionError};

/// A single result row, detached from the driver that produced it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<SqlValue>,
}

impl Row {
    /// Create a row from its column values, in select order
    #[must_use]
    pub fn new(columns: Vec<SqlValue>) -> Self {
        Self { columns }
    }

    /// Extract column `index` as `T`
    ///
    /// # Errors
    ///
    /// Returns `ValueExtractionError::ColumnIndex` for a missing column, or the
    /// conversion error produced by `T::from_value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use driftguard::{Row, SqlValue};
    ///
    /// let row = Row::new(vec![SqlValue::Integer(42), SqlValue::Text("John".into())]);
    /// let id: i64 = row.get(0).unwrap();
    /// let name: String = row.get(1).unwrap();
    /// assert_eq!((id, name.as_str()), (42, "John"));
    /// ```
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, ValueExtractionError> {
        let value = self.value(index)?;
        T::from_value(value)
    }

    /// Borrow the raw value of column `index`
    ///
    /// # Errors
    ///
    /// Returns `ValueExtractionError::ColumnIndex` if the row is shorter than `index + 1`.
    pub fn value(&self, index: usize) -> Result<&SqlValue, ValueExtractionError> {
        self.columns
            .get(index)
            .ok_or(ValueExtractionError::ColumnIndex {
                index,
                len: self.columns.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_values(self) -> Vec<SqlValue> {
        self.columns
    }
}
