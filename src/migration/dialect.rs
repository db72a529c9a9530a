//! SQL dialect tags

use std::fmt;

/// Identifies which SQL product a [`Dictionary`](super::Dictionary) targets
///
/// Passed through to every `Migration::up`/`down` call so migration bodies
/// can branch on the target database when their DDL differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Stable name, e.g. for logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "Postgres",
            Dialect::Sqlite => "SQLite3",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
