//! Migrator - Core migration execution engine
//!
//! A run is one call to [`Migrator::migrate`]. It happens inside a single
//! transaction that is retried from scratch on any error:
//!
//! 1. Ensure the state table and its sentinel row exist
//! 2. Read the current version
//! 3. Plan the steps from the current version to the target
//! 4. For each step, run its verification sequence (up/down/up forward,
//!    down/up/down backward) and persist the new version
//! 5. Commit, then send one progress notice per step
//!
//! Several processes may call `migrate` against the same database at once.
//! The database's transaction isolation serializes them; losers fail,
//! roll back, and on retry find the work already done.

use super::dialect::Dialect;
use super::dictionary::Dictionary;
use super::error::MigrationError;
use super::migration::Migration;
use super::progress::{self, ProgressLogger};
use super::registry::{Direction, MigrationPlan, MigrationRegistry, Phase};
use super::state_table::{ID_COLUMN, SENTINEL_ID, STATE_TABLE, VERSION_COLUMN};
use crate::config::MigratorConfig;
use crate::executor::Executor;
use crate::sql_params;
use crate::transaction::{Database, TransactionGuard};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a successful [`Migrator::migrate`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found in the state table when the committed attempt began
    pub from: u64,
    /// Version persisted by the committed attempt
    pub to: u64,
    /// `None` when nothing had to run
    pub direction: Option<Direction>,
    /// Versions that were run, in execution order
    pub applied: Vec<u64>,
    /// 1-based number of the attempt that committed
    pub attempts: u32,
}

impl MigrationReport {
    /// Whether any migration ran
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Transactional, retrying schema migrator
///
/// # Examples
///
/// ```rust,no_run
/// # #[cfg(feature = "sqlite")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use driftguard::driver::sqlite::SqliteDatabase;
/// use driftguard::{FnMigration, Migrator, SqliteDictionary};
///
/// let db = SqliteDatabase::open("app.db")?;
/// let mut migrator = Migrator::new(db, SqliteDictionary);
/// migrator.register(FnMigration::from_sql(
///     1,
///     "Create users",
///     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
///     "DROP TABLE users",
/// ));
/// migrator.migrate(1)?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "sqlite"))]
/// # fn main() {}
/// ```
pub struct Migrator<D: Database> {
    db: D,
    dictionary: Box<dyn Dictionary>,
    registry: MigrationRegistry,
    config: MigratorConfig,
    logger: Option<Arc<dyn ProgressLogger>>,
}

impl<D: Database> Migrator<D> {
    /// Create a migrator with default timing and no progress logger
    pub fn new(db: D, dictionary: impl Dictionary + 'static) -> Self {
        Self::with_dictionary(db, Box::new(dictionary))
    }

    /// Like [`new`](Self::new), taking an already boxed dictionary
    /// (see [`dictionary_for`](super::dictionary::dictionary_for))
    pub fn with_dictionary(db: D, dictionary: Box<dyn Dictionary>) -> Self {
        Self {
            db,
            dictionary,
            registry: MigrationRegistry::new(),
            config: MigratorConfig::default(),
            logger: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ProgressLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Register a migration; a later registration at the same version wins
    pub fn register<M: Migration + 'static>(&mut self, migration: M) -> &mut Self {
        self.registry.register(Arc::new(migration));
        self
    }

    /// Register a migration, refusing to replace one at the same version
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::AlreadyRegistered` if the version is taken.
    pub fn try_register<M: Migration + 'static>(
        &mut self,
        migration: M,
    ) -> Result<&mut Self, MigrationError> {
        self.registry.try_register(Arc::new(migration))?;
        Ok(self)
    }

    #[must_use]
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dictionary.dialect()
    }

    #[must_use]
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Bring the schema to `target`, migrating up or down as needed
    ///
    /// The whole run commits or nothing does. Failed attempts are retried
    /// after `config.attempt_delay()`, up to `config.max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error unchanged once attempts run out.
    pub fn migrate(&self, target: u64) -> Result<MigrationReport, MigrationError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::migrate_span(self.dialect(), target).entered();

        if i64::try_from(target).is_err() {
            // Refuse before touching the database; this never succeeds on retry.
            return Err(MigrationError::VersionOutOfRange(target));
        }

        let mut attempt: u32 = 0;
        let (report, notices) = retry_under_transaction(
            &self.db,
            self.config.attempt_delay(),
            self.config.max_attempts,
            |tx| {
                attempt += 1;
                self.run_attempt(tx, target, attempt)
            },
        )?;

        // Only committed work is reported.
        if let Some(logger) = &self.logger {
            for notice in &notices {
                logger.log(notice);
            }
        }

        if report.changed() {
            log::info!(
                "Migrated {} from version {} to {} ({} step(s), attempt {})",
                self.dialect(),
                report.from,
                report.to,
                report.applied.len(),
                report.attempts
            );
        } else {
            log::debug!("Schema already at version {}", report.to);
        }
        Ok(report)
    }

    /// Read the persisted version, initializing the state table if needed
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if the transaction or a statement fails.
    /// Not retried.
    pub fn current_version(&self) -> Result<u64, MigrationError> {
        attempt_under_transaction(&self.db, |tx| {
            self.ensure_state(tx)?;
            self.read_version(tx)
        })
    }

    /// Steps `migrate(target)` would run from `current`, without touching the
    /// database
    #[must_use]
    pub fn plan(&self, current: u64, target: u64) -> MigrationPlan {
        self.registry.plan(current, target)
    }

    fn run_attempt(
        &self,
        tx: &dyn Executor,
        target: u64,
        attempt: u32,
    ) -> Result<(MigrationReport, Vec<String>), MigrationError> {
        self.ensure_state(tx)?;
        let current = self.read_version(tx)?;
        let plan = self.registry.plan(current, target);

        log::debug!(
            "Attempt {attempt}: version {current} -> {target}, steps {:?}",
            plan.versions()
        );

        let Some(direction) = plan.direction() else {
            let report = MigrationReport {
                from: current,
                to: current,
                direction: None,
                applied: Vec::new(),
                attempts: attempt,
            };
            return Ok((report, Vec::new()));
        };

        let steps = plan.steps();
        let mut reached = current;
        let mut notices = Vec::with_capacity(steps.len());
        for (idx, migration) in steps.iter().enumerate() {
            self.verify(tx, migration.as_ref(), direction)?;

            // Backward, the schema now sits just below this migration: at the
            // next step's version, or at the target after the last step.
            reached = match direction {
                Direction::Forward => migration.version(),
                Direction::Backward => steps
                    .get(idx + 1)
                    .map_or(target, |next| next.version()),
            };
            self.write_version(tx, reached)?;

            notices.push(match direction {
                Direction::Forward => progress::migrated_up(migration.name()),
                Direction::Backward => progress::migrated_down(migration.name()),
            });
        }

        let report = MigrationReport {
            from: current,
            to: reached,
            direction: Some(direction),
            applied: plan.versions(),
            attempts: attempt,
        };
        Ok((report, notices))
    }

    fn verify(
        &self,
        tx: &dyn Executor,
        migration: &dyn Migration,
        direction: Direction,
    ) -> Result<(), MigrationError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::migration_step_span(
            migration.version(),
            migration.name(),
            direction,
        )
        .entered();

        let dialect = self.dialect();
        for (idx, phase) in direction.verification_sequence().into_iter().enumerate() {
            let result = match phase {
                Phase::Up => migration.up(dialect, tx),
                Phase::Down => migration.down(dialect, tx),
            };
            result.map_err(|source| MigrationError::Verification {
                version: migration.version(),
                name: migration.name().to_string(),
                direction,
                phase,
                call: idx + 1,
                source,
            })?;
        }
        log::debug!(
            "Migration '{}' (version {}) verified {direction}",
            migration.name(),
            migration.version()
        );
        Ok(())
    }

    fn ensure_state(&self, tx: &dyn Executor) -> Result<(), MigrationError> {
        tx.execute(self.dictionary.create_state_table(), &[])
            .map_err(MigrationError::Statement)?;
        tx.execute(self.dictionary.ensure_state_row(), &[])
            .map_err(MigrationError::Statement)?;
        Ok(())
    }

    fn read_version(&self, tx: &dyn Executor) -> Result<u64, MigrationError> {
        let row = tx
            .query_one(self.dictionary.current_version(), &[])
            .map_err(MigrationError::Statement)?;
        row.get::<u64>(0).map_err(|e| {
            MigrationError::InvalidState(format!(
                "{STATE_TABLE}.{VERSION_COLUMN} unreadable: {e}"
            ))
        })
    }

    fn write_version(&self, tx: &dyn Executor, version: u64) -> Result<(), MigrationError> {
        let stored = i64::try_from(version).map_err(|_| MigrationError::VersionOutOfRange(version))?;
        let updated = tx
            .execute(self.dictionary.set_current_version(), &sql_params![stored])
            .map_err(MigrationError::Statement)?;
        if updated != 1 {
            return Err(MigrationError::InvalidState(format!(
                "expected to update the {STATE_TABLE} row {ID_COLUMN} = {SENTINEL_ID}, updated {updated} row(s)"
            )));
        }
        Ok(())
    }
}

impl<D: Database> fmt::Debug for Migrator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("dialect", &self.dialect())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// Run `work` in a fresh transaction, retrying on any error
///
/// Sleeps `delay` between attempts. `max_attempts` below 1 is treated as 1.
///
/// # Errors
///
/// Returns the last attempt's error unchanged.
pub fn retry_under_transaction<D, T, F>(
    db: &D,
    delay: Duration,
    max_attempts: u32,
    mut work: F,
) -> Result<T, MigrationError>
where
    D: Database + ?Sized,
    F: FnMut(&dyn Executor) -> Result<T, MigrationError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::migrate_attempt_span(attempt, max_attempts).entered();

        match attempt_under_transaction(db, &mut work) {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                log::error!("Migration failed after {attempt} attempt(s): {e}");
                return Err(e);
            }
            Err(e) => {
                log::warn!(
                    "Migration attempt {attempt}/{max_attempts} failed, retrying in {delay:?}: {e}"
                );
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}

/// Run `work` in one transaction: commit on success, roll back otherwise
///
/// # Errors
///
/// `MigrationError::Connection` if the transaction cannot begin,
/// `MigrationError::Commit` if it cannot commit, or whatever `work` returns.
pub fn attempt_under_transaction<D, T, F>(db: &D, work: F) -> Result<T, MigrationError>
where
    D: Database + ?Sized,
    F: FnOnce(&dyn Executor) -> Result<T, MigrationError>,
{
    let guard = TransactionGuard::begin(db).map_err(MigrationError::Connection)?;
    let value = work(&guard)?;
    guard.commit().map_err(MigrationError::Commit)?;
    Ok(value)
}
