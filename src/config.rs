//! Migrator configuration
//!
//! [`MigratorConfig`] can be built in code or loaded from
//! `config/config.toml` (section `[migrator]`) and `DRIFTGUARD__MIGRATOR__*`
//! environment variables with [`MigratorConfig::load()`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Delay between migration attempts
pub const MIGRATION_ATTEMPT_DELAY: Duration = Duration::from_secs(1);

/// Attempts made before `migrate` gives up
pub const MIGRATION_MAXIMUM_ATTEMPTS: u32 = 5;

const DEFAULT_CONFIG_FILE: &str = "config/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigratorConfig {
    #[serde(default = "default_attempt_delay_ms")]
    pub attempt_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_attempt_delay_ms() -> u64 {
    u64::try_from(MIGRATION_ATTEMPT_DELAY.as_millis()).unwrap_or(u64::MAX)
}

fn default_max_attempts() -> u32 {
    MIGRATION_MAXIMUM_ATTEMPTS
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            attempt_delay_ms: default_attempt_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl MigratorConfig {
    #[must_use]
    pub fn new(attempt_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempt_delay_ms: u64::try_from(attempt_delay.as_millis()).unwrap_or(u64::MAX),
            max_attempts,
        }
    }

    #[must_use]
    pub fn attempt_delay(&self) -> Duration {
        Duration::from_millis(self.attempt_delay_ms)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Message` when `max_attempts` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Message(
                "migrator.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from `config/config.toml`, falling back to env vars, then defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source exists but cannot be parsed, or the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Like [`load`](Self::load), reading the given TOML file instead.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source exists but cannot be parsed, or the
    /// result fails validation.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("DRIFTGUARD").separator("__"))
            .build()?;

        let migrator_config = match settings.get::<MigratorConfig>("migrator") {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound(_)) => {
                log::debug!(
                    "No [migrator] section in {} or environment, using defaults",
                    path.display()
                );
                MigratorConfig::default()
            }
            Err(e) => {
                return Err(ConfigError::Message(format!(
                    "Migrator configuration could not be loaded from file or environment: {e}"
                )))
            }
        };

        migrator_config.validate()?;
        Ok(migrator_config)
    }
}
