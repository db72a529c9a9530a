//! Concrete `Database` implementations
//!
//! - [`sqlite`] (feature `sqlite`, on by default)
//! - [`postgres`] (feature `postgres`)

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
