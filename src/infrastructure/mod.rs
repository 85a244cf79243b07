//! Infrastructure layer
//!
//! Concrete counter stores and the database connection they share.

pub mod database;
pub mod log_messages;
pub mod memory_store;
pub mod postgres_store;

pub use database::Database;
pub use memory_store::{CommittedWrite, InMemoryCounterStore};
pub use postgres_store::PostgresCounterStore;
