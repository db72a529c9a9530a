//! Migration trait definition

use super::dialect::Dialect;
use crate::executor::{DbError, Executor};
use std::fmt;

/// Trait that all migrations must implement
///
/// A migration is identified by its `version`, an unsigned ordering key
/// (often a `YYYYMMDDHHMMSS` timestamp; gaps are fine). `up` applies it and
/// `down` must undo exactly what `up` did: the migrator runs `up`, `down`,
/// `up` (or `down`, `up`, `down` when reverting) inside one transaction to
/// prove that.
///
/// All schema changes must go through `tx`. Opening another connection
/// would escape the migrator's transaction.
///
/// Note: like the drivers, this is synchronous. Inside a `may` coroutine the
/// Postgres driver yields instead of blocking the thread.
pub trait Migration: Send + Sync {
    /// Human-readable name, used in progress notices and errors
    fn name(&self) -> &str;

    /// Ordering key; unique within a migrator
    fn version(&self) -> u64;

    /// Apply the migration
    ///
    /// # Errors
    ///
    /// Any error aborts the current migration attempt.
    fn up(&self, dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError>;

    /// Revert the migration
    ///
    /// # Errors
    ///
    /// Any error aborts the current migration attempt.
    fn down(&self, dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError>;
}

type Body = Box<dyn Fn(Dialect, &dyn Executor) -> Result<(), DbError> + Send + Sync>;

/// A migration assembled from closures
///
/// # Examples
///
/// ```rust
/// use driftguard::FnMigration;
///
/// let create_users = FnMigration::new(
///     1,
///     "Create users",
///     |_dialect, tx| {
///         tx.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)", &[])?;
///         Ok(())
///     },
///     |_dialect, tx| {
///         tx.execute("DROP TABLE users", &[])?;
///         Ok(())
///     },
/// );
/// # use driftguard::Migration;
/// assert_eq!(create_users.version(), 1);
/// ```
pub struct FnMigration {
    version: u64,
    name: String,
    up: Body,
    down: Body,
}

impl FnMigration {
    pub fn new<U, D>(version: u64, name: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(Dialect, &dyn Executor) -> Result<(), DbError> + Send + Sync + 'static,
        D: Fn(Dialect, &dyn Executor) -> Result<(), DbError> + Send + Sync + 'static,
    {
        Self {
            version,
            name: name.into(),
            up: Box::new(up),
            down: Box::new(down),
        }
    }

    /// A migration whose `up` and `down` each run a single statement
    pub fn from_sql(
        version: u64,
        name: impl Into<String>,
        up_sql: impl Into<String>,
        down_sql: impl Into<String>,
    ) -> Self {
        let up_sql = up_sql.into();
        let down_sql = down_sql.into();
        Self::new(
            version,
            name,
            move |_, tx| tx.execute(&up_sql, &[]).map(|_| ()),
            move |_, tx| tx.execute(&down_sql, &[]).map(|_| ()),
        )
    }
}

impl Migration for FnMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn up(&self, dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError> {
        (self.up)(dialect, tx)
    }

    fn down(&self, dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError> {
        (self.down)(dialect, tx)
    }
}

impl fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
