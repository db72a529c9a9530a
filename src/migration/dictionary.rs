//! SQL dialect dictionaries
//!
//! A dictionary supplies the literal SQL the migrator uses for its own
//! bookkeeping. Implementations differ only in parameter placeholder syntax.

use super::dialect::Dialect;
use super::state_table::{CREATE_STATE_TABLE, ENSURE_STATE_ROW, SELECT_CURRENT_VERSION};

/// Literal bookkeeping queries for one SQL dialect
///
/// The two "ensure" queries must be idempotent: re-running them against an
/// initialized database changes nothing.
pub trait Dictionary: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Create the state table if it does not exist
    fn create_state_table(&self) -> &'static str;

    /// Insert the sentinel row at version 0 if it does not exist
    fn ensure_state_row(&self) -> &'static str;

    /// Select the current version; one row, one column
    fn current_version(&self) -> &'static str;

    /// Update the current version; one parameter, the new version
    fn set_current_version(&self) -> &'static str;
}

/// Dictionary for PostgreSQL (`$1` placeholders)
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDictionary;

impl Dictionary for PostgresDictionary {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn create_state_table(&self) -> &'static str {
        CREATE_STATE_TABLE
    }

    fn ensure_state_row(&self) -> &'static str {
        ENSURE_STATE_ROW
    }

    fn current_version(&self) -> &'static str {
        SELECT_CURRENT_VERSION
    }

    fn set_current_version(&self) -> &'static str {
        "UPDATE migration_state SET ts = $1 WHERE id = 0"
    }
}

/// Dictionary for SQLite (`?` placeholders)
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDictionary;

impl Dictionary for SqliteDictionary {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn create_state_table(&self) -> &'static str {
        CREATE_STATE_TABLE
    }

    fn ensure_state_row(&self) -> &'static str {
        ENSURE_STATE_ROW
    }

    fn current_version(&self) -> &'static str {
        SELECT_CURRENT_VERSION
    }

    fn set_current_version(&self) -> &'static str {
        "UPDATE migration_state SET ts = ? WHERE id = 0"
    }
}

/// The built-in dictionary for `dialect`
#[must_use]
pub fn dictionary_for(dialect: Dialect) -> Box<dyn Dictionary> {
    match dialect {
        Dialect::Postgres => Box::new(PostgresDictionary),
        Dialect::Sqlite => Box::new(SqliteDictionary),
    }
}
