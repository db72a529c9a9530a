//! Progress notices
//!
//! The migrator reports each verified step to an optional [`ProgressLogger`]:
//!
//! - `Migrated up to '<name>' successfully.`
//! - `Migrated down from '<name>' successfully.`
//!
//! Only successes are reported; failures travel in the returned error.

use parking_lot::Mutex;

/// Receives human-readable progress notices
pub trait ProgressLogger: Send + Sync {
    fn log(&self, message: &str);
}

/// Forwards notices to the `log` facade at `info` level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressLogger for LogProgress {
    fn log(&self, message: &str) {
        log::info!("{message}");
    }
}

/// Keeps every notice in memory
///
/// Useful in tests and for callers that want to report what a run did.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice received so far, oldest first
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    #[must_use]
    pub fn contains(&self, message: &str) -> bool {
        self.lines.lock().iter().any(|line| line == message)
    }

    /// Panics unless `message` was logged
    ///
    /// # Panics
    ///
    /// When no logged line equals `message`.
    #[track_caller]
    pub fn assert_logged(&self, message: &str) {
        let lines = self.lines();
        assert!(
            lines.iter().any(|line| line == message),
            "expected {message:?} to have been logged; got {lines:?}"
        );
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ProgressLogger for MemoryLogger {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

pub(crate) fn migrated_up(name: &str) -> String {
    format!("Migrated up to '{name}' successfully.")
}

pub(crate) fn migrated_down(name: &str) -> String {
    format!("Migrated down from '{name}' successfully.")
}
