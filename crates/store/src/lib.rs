//! Session persistence backends for Caliper.

pub mod noop;
pub mod in_memory;
pub mod file_backend;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use noop::NoopStore;
pub use in_memory::InMemoryStore;
pub use file_backend::FileStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
