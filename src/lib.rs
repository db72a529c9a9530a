//! # Driftguard
//!
//! Transactional, self-verifying, retrying schema migrations for SQL
//! databases.
//!
//! Register versioned migrations with a [`Migrator`], then call
//! [`Migrator::migrate`] with a target version. The migrator moves the schema
//! up or down to the target inside one transaction, checks that every
//! migration's `down` really undoes its `up`, records the version in a
//! single-row `migration_state` table, and retries the whole run when a
//! concurrent migrator gets in the way.
//!
//! Drivers:
//! - SQLite via `rusqlite` (feature `sqlite`, default)
//! - PostgreSQL via `may_postgres` (feature `postgres`)
//!
//! Other backends plug in by implementing [`Database`], [`Transaction`] and
//! [`Executor`].

pub mod config;
pub mod connection;
pub mod driver;
pub mod executor;
pub mod migration;
pub mod transaction;
pub mod value;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::MigratorConfig;
pub use executor::{DbError, Executor};
pub use migration::{
    dictionary_for, Dialect, Dictionary, Direction, FnMigration, LogProgress, MemoryLogger,
    Migration, MigrationError, MigrationPlan, MigrationRegistry, MigrationReport, Migrator,
    Phase, PostgresDictionary, ProgressLogger, SqliteDictionary,
};
pub use transaction::{Database, IsolationLevel, Transaction, TransactionGuard};
pub use value::{FromValue, Row, SqlValue, ValueExtractionError};
