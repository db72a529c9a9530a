//! SQLite driver over `rusqlite`
//!
//! One `SqliteDatabase` owns one connection. Run several migrators against the
//! same file by giving each its own `SqliteDatabase`; SQLite's file lock then
//! arbitrates between them.

use crate::executor::{DbError, Executor};
use crate::transaction::{Database, Transaction};
use crate::value::{Row, SqlValue};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Batch, Connection, ToSql};
use std::path::Path;
use std::time::Duration;

/// Default time a connection waits on a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A SQLite database handle
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open (or create) the database file at `path`
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, applying the default busy timeout
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if the busy timeout cannot be set.
    pub fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Override the busy timeout
    ///
    /// # Errors
    ///
    /// Returns `DbError::Sqlite` if SQLite rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<(), DbError> {
        self.conn.lock().busy_timeout(timeout)?;
        Ok(())
    }

    /// Run `f` against the raw connection, outside any migrator transaction
    ///
    /// Blocks while a transaction from this handle is open.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.conn.lock())
    }
}

impl Database for SqliteDatabase {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, DbError> {
        let conn = self.conn.lock();
        // IMMEDIATE takes the write lock up front, so two migrators never
        // both read the version and then deadlock upgrading to write.
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction { conn, closed: false }))
    }
}

/// An open SQLite transaction; holds the connection lock until closed
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    closed: bool,
}

impl SqliteTransaction<'_> {
    fn finish(&mut self, sql: &str) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::Closed);
        }
        self.conn.execute_batch(sql)?;
        self.closed = true;
        Ok(())
    }

    fn open(&self) -> Result<&Connection, DbError> {
        if self.closed {
            return Err(DbError::Closed);
        }
        Ok(&self.conn)
    }
}

struct Param<'v>(&'v SqlValue);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
        })
    }
}

fn decode(value: ValueRef<'_>) -> Result<SqlValue, DbError> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Real(v),
        ValueRef::Text(bytes) => SqlValue::Text(
            String::from_utf8(bytes.to_vec())
                .map_err(|e| DbError::Other(format!("Invalid UTF-8 in text column: {e}")))?,
        ),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

impl Executor for SqliteTransaction<'_> {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        let conn = self.open()?;

        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::execute_statement_span(sql).entered();

        // Migration bodies are often several statements in one string; run
        // them all. Rows affected are summed across the batch.
        if params.is_empty() {
            let before = conn.total_changes();
            conn.execute_batch(sql)?;
            return Ok(conn.total_changes().saturating_sub(before));
        }

        let mut batch = Batch::new(conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Ok(0);
        };
        // Parameters bind to a single statement; anything after it would be
        // silently skipped.
        if !matches!(batch.next(), Ok(None)) {
            return Err(DbError::Other(
                "Parameters can only be bound to a single SQL statement".to_string(),
            ));
        }
        let params: Vec<Param<'_>> = params.iter().map(Param).collect();
        let affected = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        let conn = self.open()?;

        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::execute_statement_span(sql).entered();

        let params: Vec<Param<'_>> = params.iter().map(Param).collect();
        let mut stmt = conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(width);
            for i in 0..width {
                columns.push(decode(row.get_ref(i)?)?);
            }
            out.push(Row::new(columns));
        }
        Ok(out)
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn commit(mut self: Box<Self>) -> Result<(), DbError> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<(), DbError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.closed && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                log::warn!("Failed to roll back SQLite transaction: {e}");
            }
        }
    }
}
