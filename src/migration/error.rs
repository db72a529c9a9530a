//! Migration-specific error types

use super::registry::{Direction, Phase};
use crate::executor::DbError;

/// Migration-specific errors
///
/// Every variant raised inside an attempt rolls that attempt back and is
/// retried; only the last attempt's error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A transaction could not be started
    #[error("Could not begin migration transaction: {0}")]
    Connection(#[source] DbError),

    /// A bookkeeping statement (state table create/seed/read/write) failed
    #[error("Migration state statement failed: {0}")]
    Statement(#[source] DbError),

    /// A migration body failed somewhere in its verification sequence
    #[error(
        "Migration '{name}' (version {version}) failed at call {call} ({phase}) of its {direction} verification: {source}"
    )]
    Verification {
        version: u64,
        name: String,
        direction: Direction,
        phase: Phase,
        /// 1-based position in the up/down/up or down/up/down sequence
        call: usize,
        #[source]
        source: DbError,
    },

    /// The transaction could not be committed, typically because a
    /// concurrent migrator won the race
    #[error("Could not commit migration transaction: {0}")]
    Commit(#[source] DbError),

    /// The version cannot be stored in the state table's signed column
    #[error("Version {0} exceeds the largest storable version ({max})", max = i64::MAX)]
    VersionOutOfRange(u64),

    /// The state table holds something unusable
    #[error("Invalid migration state: {0}")]
    InvalidState(String),

    /// `try_register` found the version already taken
    #[error("Migration '{name}' (version {version}) is already registered")]
    AlreadyRegistered { version: u64, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_verification_display_names_migration_and_phase() {
        let err = MigrationError::Verification {
            version: 2,
            name: "Test Migration 2".to_string(),
            direction: Direction::Forward,
            phase: Phase::Down,
            call: 2,
            source: DbError::Other("no such table".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("'Test Migration 2' (version 2)"));
        assert!(message.contains("call 2 (down)"));
        assert!(message.contains("forward verification"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_version_out_of_range_display() {
        let err = MigrationError::VersionOutOfRange(u64::MAX);
        assert!(err.to_string().contains(&i64::MAX.to_string()));
    }

    #[test]
    fn test_statement_error_keeps_source() {
        let err = MigrationError::Statement(DbError::NoRows);
        assert!(err.to_string().contains("no rows"));
        assert!(matches!(
            err.source().and_then(|s| s.downcast_ref::<DbError>()),
            Some(DbError::NoRows)
        ));
    }
}
