//! Transaction Module
//!
//! Provides the collaborator traits the migrator consumes:
//! - `Database`: something that can begin a transaction
//! - `Transaction`: an `Executor` that can be committed or rolled back
//! - `TransactionGuard`: scoped ownership that rolls back on every exit path
//!   unless `commit()` succeeded
//! - `IsolationLevel`: requested isolation for drivers that support it

use crate::executor::{DbError, Executor};
use crate::value::{Row, SqlValue};
use serde::Deserialize;
use std::sync::Arc;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Read committed (default)
    #[default]
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable
    Serializable,
}

impl IsolationLevel {
    /// Render as SQL, e.g. for `BEGIN ISOLATION LEVEL ...`
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// An open database transaction
///
/// Implementations must roll back on drop when neither `commit` nor
/// `rollback` completed successfully.
pub trait Transaction: Executor {
    /// Commit all work done in the transaction
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the commit is rejected, e.g. on a serialization
    /// conflict with a concurrent writer.
    fn commit(self: Box<Self>) -> Result<(), DbError>;

    /// Discard all work done in the transaction
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the driver fails to roll back.
    fn rollback(self: Box<Self>) -> Result<(), DbError>;
}

/// A handle that can begin transactions
///
/// Each call to `begin` may block on the driver's lock manager.
pub trait Database {
    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns `DbError` (typically `DbError::Connection` or a driver error)
    /// when no transaction can be started.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, DbError>;
}

impl<D: Database + ?Sized> Database for &D {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, DbError> {
        (**self).begin()
    }
}

impl<D: Database + ?Sized> Database for Arc<D> {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, DbError> {
        (**self).begin()
    }
}

/// Scoped owner of an open transaction
///
/// Dropping the guard without a successful `commit()` rolls the transaction
/// back. Rollback failures during drop are logged, not propagated.
///
/// # Examples
///
/// ```rust,no_run
/// # #[cfg(feature = "sqlite")]
/// # fn main() -> Result<(), driftguard::DbError> {
/// use driftguard::{Executor, TransactionGuard};
/// use driftguard::driver::sqlite::SqliteDatabase;
///
/// let db = SqliteDatabase::open_in_memory()?;
/// let guard = TransactionGuard::begin(&db)?;
/// guard.execute("CREATE TABLE t (id INTEGER)", &[])?;
/// guard.commit()?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "sqlite"))]
/// # fn main() {}
/// ```
pub struct TransactionGuard<'a> {
    tx: Option<Box<dyn Transaction + 'a>>,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a transaction on `db` and take ownership of it
    ///
    /// # Errors
    ///
    /// Returns the error from `Database::begin`.
    pub fn begin<D: Database + ?Sized>(db: &'a D) -> Result<Self, DbError> {
        let tx = db.begin()?;
        Ok(Self::new(tx))
    }

    /// Wrap an already-open transaction
    #[must_use]
    pub fn new(tx: Box<dyn Transaction + 'a>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Commit and disarm the guard
    ///
    /// # Errors
    ///
    /// Returns the driver's commit error. The driver rolls the transaction
    /// back when its commit fails.
    pub fn commit(mut self) -> Result<(), DbError> {
        match self.tx.take() {
            Some(tx) => tx.commit(),
            None => Err(DbError::Closed),
        }
    }

    /// Roll back explicitly instead of waiting for drop
    ///
    /// # Errors
    ///
    /// Returns the driver's rollback error.
    pub fn rollback(mut self) -> Result<(), DbError> {
        match self.tx.take() {
            Some(tx) => tx.rollback(),
            None => Err(DbError::Closed),
        }
    }

    /// Whether the guard still owns an open transaction
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tx.is_some()
    }

    fn active(&self) -> Result<&(dyn Transaction + 'a), DbError> {
        self.tx.as_deref().ok_or(DbError::Closed)
    }
}

impl Executor for TransactionGuard<'_> {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        self.active()?.execute(sql, params)
    }

    fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        self.active()?.query_all(sql, params)
    }

    fn query_one(&self, sql: &str, params: &[SqlValue]) -> Result<Row, DbError> {
        self.active()?.query_one(sql, params)
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback() {
                log::warn!("Failed to roll back transaction: {e}");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every transaction lifecycle event; statements always succeed
    /// unless they contain `FAIL`.
    #[derive(Default)]
    pub(crate) struct JournalDatabase {
        pub(crate) events: Mutex<Vec<String>>,
        pub(crate) fail_begin: bool,
        pub(crate) fail_commit: bool,
    }

    pub(crate) struct JournalTransaction<'a> {
        db: &'a JournalDatabase,
    }

    impl JournalDatabase {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl Database for JournalDatabase {
        fn begin(&self) -> Result<Box<dyn Transaction + '_>, DbError> {
            if self.fail_begin {
                return Err(DbError::Connection("refused".to_string()));
            }
            self.events.lock().push("BEGIN".to_string());
            Ok(Box::new(JournalTransaction { db: self }))
        }
    }

    impl Executor for JournalTransaction<'_> {
        fn execute(&self, sql: &str, _params: &[SqlValue]) -> Result<u64, DbError> {
            self.db.events.lock().push(sql.to_string());
            if sql.contains("FAIL") {
                return Err(DbError::Other(format!("statement failed: {sql}")));
            }
            Ok(1)
        }

        fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
            self.execute(sql, params)?;
            Ok(vec![Row::new(vec![SqlValue::Integer(0)])])
        }
    }

    impl Transaction for JournalTransaction<'_> {
        fn commit(self: Box<Self>) -> Result<(), DbError> {
            if self.db.fail_commit {
                self.db.events.lock().push("COMMIT FAILED".to_string());
                return Err(DbError::Other("could not serialize access".to_string()));
            }
            self.db.events.lock().push("COMMIT".to_string());
            Ok(())
        }

        fn rollback(self: Box<Self>) -> Result<(), DbError> {
            self.db.events.lock().push("ROLLBACK".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_isolation_level_to_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.to_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.to_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.to_sql(), "SERIALIZABLE");
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_guard_commit_disarms_rollback() {
        let db = JournalDatabase::default();
        let guard = TransactionGuard::begin(&db).unwrap();
        guard.execute("INSERT 1", &[]).unwrap();
        guard.commit().unwrap();
        assert_eq!(db.events(), ["BEGIN", "INSERT 1", "COMMIT"]);
    }

    #[test]
    fn test_guard_drop_rolls_back() {
        let db = JournalDatabase::default();
        {
            let guard = TransactionGuard::begin(&db).unwrap();
            guard.execute("INSERT 1", &[]).unwrap();
        }
        assert_eq!(db.events(), ["BEGIN", "INSERT 1", "ROLLBACK"]);
    }

    #[test]
    fn test_guard_rolls_back_on_early_return() {
        fn work(db: &JournalDatabase) -> Result<(), DbError> {
            let guard = TransactionGuard::begin(db)?;
            guard.execute("FAIL", &[])?;
            guard.commit()
        }

        let db = JournalDatabase::default();
        assert!(work(&db).is_err());
        assert_eq!(db.events(), ["BEGIN", "FAIL", "ROLLBACK"]);
    }

    #[test]
    fn test_begin_failure_is_surfaced() {
        let db = JournalDatabase {
            fail_begin: true,
            ..JournalDatabase::default()
        };
        assert!(matches!(
            TransactionGuard::begin(&db),
            Err(DbError::Connection(_))
        ));
        assert!(db.events().is_empty());
    }
}
