//! Storage backends
//!
//! [`PgBackend`] for PostgreSQL, [`MemoryBackend`] for tests and demos.

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;
