//! Span helpers for the optional `tracing` feature
//!
//! Callers enter the returned span for the duration of the operation:
//! `let _span = tracing_helpers::migrate_span(dialect, target).entered();`

use crate::migration::{Dialect, Direction};
use tracing::Span;

/// One `Migrator::migrate` call
pub fn migrate_span(dialect: Dialect, target: u64) -> Span {
    tracing::info_span!("driftguard.migrate", dialect = dialect.as_str(), target_version = target)
}

/// One transactional attempt inside a migrate call
pub fn migrate_attempt_span(attempt: u32, max_attempts: u32) -> Span {
    tracing::debug_span!("driftguard.attempt", attempt, max_attempts)
}

/// Verification of a single migration
pub fn migration_step_span(version: u64, name: &str, direction: Direction) -> Span {
    tracing::debug_span!(
        "driftguard.step",
        version,
        migration = name,
        direction = %direction
    )
}

/// One SQL statement sent to a driver
pub fn execute_statement_span(sql: &str) -> Span {
    tracing::trace_span!("driftguard.statement", sql = sql.trim())
}
