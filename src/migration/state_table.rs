//! Migration state table layout
//!
//! The state table holds exactly one row, keyed by a sentinel id, whose
//! `ts` column is the version the schema currently sits at. Other tooling may
//! query it, so the table and column names are fixed.

/// Name of the state tracking table
pub(crate) const STATE_TABLE: &str = "migration_state";

/// Identity column; always [`SENTINEL_ID`]
pub(crate) const ID_COLUMN: &str = "id";

/// Current schema version column
pub(crate) const VERSION_COLUMN: &str = "ts";

/// Row identity of the single state row
pub(crate) const SENTINEL_ID: i64 = 0;

/// `CREATE TABLE IF NOT EXISTS` for the state table; portable across dialects
pub(crate) const CREATE_STATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS migration_state (
        id INTEGER NOT NULL DEFAULT 0 PRIMARY KEY,
        ts BIGINT NOT NULL DEFAULT 0
    )
";

/// Seeds the sentinel row at version 0 unless it is already present
pub(crate) const ENSURE_STATE_ROW: &str = "
    INSERT INTO migration_state (id, ts)
    SELECT 0, 0
    WHERE NOT EXISTS (SELECT 1 FROM migration_state m WHERE m.id = 0)
";

pub(crate) const SELECT_CURRENT_VERSION: &str = "
    SELECT ts FROM migration_state WHERE id = 0
";
