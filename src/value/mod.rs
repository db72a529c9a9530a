//! Value type system for driftguard
//!
//! Migration bodies and the engine's own bookkeeping talk to every driver
//! through the same two types:
//!
//! - **`SqlValue`** - a dialect-neutral parameter or column value
//! - **`Row`** - an owned result row of `SqlValue` columns
//!
//! Extraction goes through [`FromValue`], which reports null columns, type
//! mismatches and integer overflow as [`ValueExtractionError`].

pub mod row;
pub mod types;

pub use row::Row;
pub use types::{FromValue, SqlValue, ValueExtractionError};

/// Build a `Vec<SqlValue>` parameter list from heterogeneous expressions.
///
/// ```rust
/// use driftguard::{sql_params, SqlValue};
///
/// let params = sql_params![42_i64, "John Smith", None::<i64>];
/// assert_eq!(params[0], SqlValue::Integer(42));
/// assert_eq!(params[1], SqlValue::Text("John Smith".to_string()));
/// assert_eq!(params[2], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! sql_params {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::SqlValue::from($value)),+]
    };
}
