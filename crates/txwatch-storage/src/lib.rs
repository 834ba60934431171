//! txwatch-storage — pluggable address index backends.
//!
//! Backends:
//! - [`memory`] — in-memory (default, no persistence)
//! - `sqlite` — SQLite via `sqlx` (feature `sqlite`, single-file persistence)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryAddressIndex;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteAddressIndex;
