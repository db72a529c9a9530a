//! Migration registry and range planning

use super::error::MigrationError;
use super::migration::Migration;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound::{Excluded, Included};
use std::sync::Arc;

/// Which way a plan moves the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards a higher version; steps ascend
    Forward,
    /// Towards a lower version; steps descend
    Backward,
}

/// One call in a verification sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Up,
    Down,
}

impl Direction {
    /// The three calls made per migration: up/down/up forward,
    /// down/up/down backward. Net effect is a single `up` (or `down`), and
    /// the middle call proves the reverse operation really reverses.
    #[must_use]
    pub fn verification_sequence(self) -> [Phase; 3] {
        match self {
            Direction::Forward => [Phase::Up, Phase::Down, Phase::Up],
            Direction::Backward => [Phase::Down, Phase::Up, Phase::Down],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Up => f.write_str("up"),
            Phase::Down => f.write_str("down"),
        }
    }
}

/// Ordered migrations needed to move from one version to another
#[derive(Clone, Default)]
pub struct MigrationPlan {
    direction: Option<Direction>,
    steps: Vec<Arc<dyn Migration>>,
}

impl MigrationPlan {
    /// `None` when current and target versions are equal
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn Migration>] {
        &self.steps
    }

    /// Step versions, in execution order
    #[must_use]
    pub fn versions(&self) -> Vec<u64> {
        self.steps.iter().map(|m| m.version()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationPlan")
            .field("direction", &self.direction)
            .field("versions", &self.versions())
            .finish()
    }
}

/// Migrations keyed by version
///
/// Build it once, then only read it: the migrator takes `&mut self` to
/// register and `&self` to migrate.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<u64, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration, replacing any migration at the same version
    ///
    /// Returns the replaced migration, if there was one.
    pub fn register(&mut self, migration: Arc<dyn Migration>) -> Option<Arc<dyn Migration>> {
        let version = migration.version();
        let replaced = self.migrations.insert(version, migration);
        if let Some(previous) = &replaced {
            log::warn!(
                "Migration '{}' (version {}) replaced by a later registration",
                previous.name(),
                version
            );
        }
        replaced
    }

    /// Register a migration, refusing to replace an existing one
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::AlreadyRegistered` if the version is taken.
    pub fn try_register(&mut self, migration: Arc<dyn Migration>) -> Result<(), MigrationError> {
        let version = migration.version();
        if let Some(existing) = self.migrations.get(&version) {
            return Err(MigrationError::AlreadyRegistered {
                version,
                name: existing.name().to_string(),
            });
        }
        self.migrations.insert(version, migration);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Registered versions, ascending
    #[must_use]
    pub fn versions(&self) -> Vec<u64> {
        self.migrations.keys().copied().collect()
    }

    /// Compute the steps that move the schema from `current` to `target`
    ///
    /// Forward selects versions in `(current, target]` ascending; backward
    /// selects `(target, current]` descending. Registration order is
    /// irrelevant.
    #[must_use]
    pub fn plan(&self, current: u64, target: u64) -> MigrationPlan {
        if current == target {
            return MigrationPlan::default();
        }

        if target > current {
            MigrationPlan {
                direction: Some(Direction::Forward),
                steps: self
                    .migrations
                    .range((Excluded(current), Included(target)))
                    .map(|(_, m)| Arc::clone(m))
                    .collect(),
            }
        } else {
            MigrationPlan {
                direction: Some(Direction::Backward),
                steps: self
                    .migrations
                    .range((Excluded(target), Included(current)))
                    .rev()
                    .map(|(_, m)| Arc::clone(m))
                    .collect(),
            }
        }
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.migrations.iter().map(|(v, m)| (v, m.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::FnMigration;

    fn noop(version: u64) -> Arc<dyn Migration> {
        Arc::new(FnMigration::new(
            version,
            format!("Migration {version}"),
            |_, _| Ok(()),
            |_, _| Ok(()),
        ))
    }

    fn registry(versions: &[u64]) -> MigrationRegistry {
        let mut registry = MigrationRegistry::new();
        for &v in versions {
            registry.register(noop(v));
        }
        registry
    }

    #[test]
    fn test_forward_range() {
        let plan = registry(&[1, 2, 3, 4]).plan(2, 4);
        assert_eq!(plan.direction(), Some(Direction::Forward));
        assert_eq!(plan.versions(), vec![3, 4]);
    }

    #[test]
    fn test_backward_range() {
        let plan = registry(&[1, 2, 3, 4]).plan(4, 1);
        assert_eq!(plan.direction(), Some(Direction::Backward));
        assert_eq!(plan.versions(), vec![4, 3, 2]);
    }

    #[test]
    fn test_equal_versions_are_a_no_op() {
        let plan = registry(&[1, 2, 3, 4]).plan(3, 3);
        assert_eq!(plan.direction(), None);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_registration_order_is_irrelevant() {
        let plan = registry(&[4, 1, 3, 2]).plan(0, 4);
        assert_eq!(plan.versions(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sparse_versions() {
        let registry = registry(&[20240101, 20240215, 20240301]);
        assert_eq!(registry.plan(0, 20240220).versions(), vec![20240101, 20240215]);
        assert_eq!(registry.plan(20240301, 20240101).versions(), vec![20240301, 20240215]);
        assert_eq!(registry.plan(20240101, 20240102).versions(), Vec::<u64>::new());
        assert_eq!(
            registry.plan(20240101, 20240102).direction(),
            Some(Direction::Forward)
        );
    }

    #[test]
    fn test_target_beyond_last_migration() {
        let plan = registry(&[1, 2]).plan(0, u64::MAX);
        assert_eq!(plan.versions(), vec![1, 2]);
    }

    #[test]
    fn test_register_overwrites_silently() {
        let mut registry = registry(&[1]);
        let replacement: Arc<dyn Migration> =
            Arc::new(FnMigration::from_sql(1, "Replacement", "a", "b"));
        let replaced = registry.register(replacement);

        assert_eq!(replaced.map(|m| m.name().to_string()), Some("Migration 1".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.plan(0, 1).steps()[0].name(), "Replacement");
    }

    #[test]
    fn test_try_register_rejects_duplicates() {
        let mut registry = registry(&[1]);
        let err = registry.try_register(noop(1)).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::AlreadyRegistered { version: 1, .. }
        ));
        assert!(registry.try_register(noop(2)).is_ok());
        assert_eq!(registry.versions(), vec![1, 2]);
    }

    #[test]
    fn test_verification_sequences() {
        assert_eq!(
            Direction::Forward.verification_sequence(),
            [Phase::Up, Phase::Down, Phase::Up]
        );
        assert_eq!(
            Direction::Backward.verification_sequence(),
            [Phase::Down, Phase::Up, Phase::Down]
        );
    }
}
