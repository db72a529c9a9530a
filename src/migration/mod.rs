//! Migration system for driftguard
//!
//! This module provides:
//! - `Migration` trait definition and the closure-based `FnMigration`
//! - Dialect dictionaries for the state table bookkeeping
//! - `MigrationRegistry` and range planning
//! - `Migrator`, the transactional retrying engine
//! - Progress notices
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use driftguard::driver::sqlite::SqliteDatabase;
//! use driftguard::migration::{Dialect, Migration, Migrator, SqliteDictionary};
//! use driftguard::{DbError, Executor};
//!
//! pub struct CreateUsersTable;
//!
//! impl Migration for CreateUsersTable {
//!     fn name(&self) -> &str {
//!         "create_users_table"
//!     }
//!
//!     fn version(&self) -> u64 {
//!         20240120120000
//!     }
//!
//!     fn up(&self, dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError> {
//!         let id = match dialect {
//!             Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
//!             Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
//!         };
//!         tx.execute(&format!("CREATE TABLE users (id {id}, email TEXT NOT NULL)"), &[])?;
//!         Ok(())
//!     }
//!
//!     fn down(&self, _dialect: Dialect, tx: &dyn Executor) -> Result<(), DbError> {
//!         tx.execute("DROP TABLE users", &[])?;
//!         Ok(())
//!     }
//! }
//!
//! let mut migrator = Migrator::new(SqliteDatabase::open("app.db")?, SqliteDictionary);
//! migrator.register(CreateUsersTable);
//! migrator.migrate(20240120120000)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

pub mod dialect;
pub mod dictionary;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod progress;
pub mod registry;
pub mod state_table;

pub use dialect::Dialect;
pub use dictionary::{dictionary_for, Dictionary, PostgresDictionary, SqliteDictionary};
pub use error::MigrationError;
pub use migration::{FnMigration, Migration};
pub use migrator::{
    attempt_under_transaction, retry_under_transaction, MigrationReport, Migrator,
};
pub use progress::{LogProgress, MemoryLogger, ProgressLogger};
pub use registry::{Direction, MigrationPlan, MigrationRegistry, Phase};
