//! Durable counter store interface
//!
//! Both reservation controllers talk to the counter only through this trait.
//! Every mutation goes through one of its two atomic primitives: the
//! version-checked `conditional_write` or a transaction opened by
//! `with_exclusive_lock`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Counter, CounterId, CounterName, CounterSnapshot, StockLevel, Version};

/// Infrastructure failures reported by a counter store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction aborted as deadlock victim: {0}")]
    Deadlock(String),

    #[error("Counter not found: {0}")]
    CounterNotFound(CounterId),

    #[error("Stored {column} out of range: {value}")]
    InvalidStoredValue { column: &'static str, value: i64 },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Attempt aborted: {0}")]
    Aborted(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                Some("40P01") => return Self::Deadlock(db.message().to_string()),
                Some("23505") | Some("23514") => {
                    return Self::ConstraintViolation(db.message().to_string())
                }
                _ => {}
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// What a critical section asks the locked transaction to do on exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDecision {
    /// Persist `new_value`, bump the version and commit
    Commit { new_value: StockLevel },
    /// Leave the counter untouched and roll back
    Rollback { observed: StockLevel },
}

/// Work performed while the counter's row lock is held
#[async_trait]
pub trait CriticalSection: Send + Sync {
    async fn run(&self, locked: CounterSnapshot) -> LockDecision;
}

/// Storage for the shared counter
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Seed a counter at version 0
    async fn create_counter(&self, name: CounterName, initial: StockLevel)
        -> StoreResult<Counter>;

    /// Unsynchronized snapshot read. Does not wait for lock holders.
    async fn read(&self, id: CounterId) -> StoreResult<CounterSnapshot>;

    /// Set `new_value` and bump the version only if the stored version still
    /// equals `expected`. Returns the number of rows changed (0 or 1).
    async fn conditional_write(
        &self,
        id: CounterId,
        expected: Version,
        new_value: StockLevel,
    ) -> StoreResult<u64>;

    /// Run `section` inside a transaction holding the counter's exclusive
    /// row lock, then commit or roll back as the section decides.
    ///
    /// The lock is released only when the transaction has fully ended.
    async fn with_exclusive_lock(
        &self,
        id: CounterId,
        section: &dyn CriticalSection,
    ) -> StoreResult<LockDecision>;
}
