//! `Executor` Module
//!
//! Provides the `Executor` trait that abstracts statement execution over every
//! supported driver, and the `DbError` type those drivers report.
//!
//! Migration bodies receive a `&dyn Executor` bound to the migrator's open
//! transaction, so everything they run shares that transaction's fate.

use crate::value::{Row, SqlValue, ValueExtractionError};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// SQLite error from `rusqlite`
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL error from `may_postgres`
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] may_postgres::Error),

    /// Could not establish a connection or start a transaction
    #[error("Connection error: {0}")]
    Connection(String),

    /// `query_one` matched no rows
    #[error("Query returned no rows")]
    NoRows,

    /// `query_one` matched more than one row
    #[error("Query returned {0} rows, expected exactly one")]
    TooManyRows(usize),

    /// The transaction was already committed or rolled back
    #[error("Transaction has already been committed or rolled back")]
    Closed,

    /// A column could not be converted
    #[error("Value error: {0}")]
    Value(#[from] ValueExtractionError),

    /// Anything else, including errors raised by migration bodies
    #[error("Execution error: {0}")]
    Other(String),
}

/// Trait for executing statements
///
/// # Examples
///
/// ```rust
/// use driftguard::{sql_params, DbError, Executor};
///
/// fn insert_user(executor: &dyn Executor) -> Result<(), DbError> {
///     executor.execute(
///         "INSERT INTO user (id, name) VALUES (?, ?)",
///         &sql_params![42_i64, "John Smith"],
///     )?;
///     Ok(())
/// }
/// ```
pub trait Executor {
    /// Execute a statement and return the number of rows affected
    ///
    /// Placeholder syntax is the driver's own (`?` for SQLite, `$1` for Postgres).
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the statement fails.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError>;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails or a column cannot be decoded.
    fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError>;

    /// Execute a query that must return exactly one row
    ///
    /// # Errors
    ///
    /// Returns `DbError::NoRows` or `DbError::TooManyRows` when the row count
    /// is not exactly one, or `DbError` if the query fails.
    fn query_one(&self, sql: &str, params: &[SqlValue]) -> Result<Row, DbError> {
        let mut rows = self.query_all(sql, params)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(DbError::NoRows),
            n => Err(DbError::TooManyRows(n)),
        }
    }
}
