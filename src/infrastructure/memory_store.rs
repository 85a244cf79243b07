//! In-memory counter store
//!
//! Mirrors the locking behaviour of the PostgreSQL store closely enough for
//! the controllers' guarantees to be tested without a database:
//! - plain reads see the last committed state and never wait for a lock
//! - every write takes the counter's row lock, as `UPDATE` does
//! - `with_exclusive_lock` holds the row lock until it commits or rolls back

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::application::counter_store::{
    CounterStore, CriticalSection, LockDecision, StoreError, StoreResult,
};
use crate::domain::{Counter, CounterId, CounterName, CounterSnapshot, StockLevel, Version};

/// A committed state of some counter, in commit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedWrite {
    pub counter_id: CounterId,
    pub value: StockLevel,
    pub version: Version,
}

#[derive(Debug, Clone, Copy)]
struct CommittedState {
    value: StockLevel,
    version: Version,
}

struct CounterRecord {
    committed: Mutex<CommittedState>,
    // Held across awaits by lock holders, hence the async mutex.
    row_lock: tokio::sync::Mutex<()>,
}

pub struct InMemoryCounterStore {
    counters: RwLock<HashMap<CounterId, Arc<CounterRecord>>>,
    next_id: AtomicI64,
    history: Mutex<Vec<CommittedWrite>>,
    applied_writes: AtomicU64,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            history: Mutex::new(Vec::new()),
            applied_writes: AtomicU64::new(0),
        }
    }

    /// Every committed state so far, including each counter's initial one
    pub fn history(&self) -> Vec<CommittedWrite> {
        self.history.lock().clone()
    }

    /// Number of writes committed after seeding
    pub fn applied_writes(&self) -> u64 {
        self.applied_writes.load(Ordering::SeqCst)
    }

    fn record(&self, id: CounterId) -> StoreResult<Arc<CounterRecord>> {
        self.counters
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::CounterNotFound(id))
    }

    fn commit(&self, id: CounterId, state: &mut CommittedState, new_value: StockLevel) {
        state.value = new_value;
        state.version = state.version.next();
        self.history.lock().push(CommittedWrite {
            counter_id: id,
            value: state.value,
            version: state.version,
        });
        self.applied_writes.fetch_add(1, Ordering::SeqCst);
        trace!(counter_id = %id, value = %state.value, version = %state.version, "committed");
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn create_counter(
        &self,
        name: CounterName,
        initial: StockLevel,
    ) -> StoreResult<Counter> {
        let raw_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = CounterId::try_new(raw_id).map_err(|_| StoreError::InvalidStoredValue {
            column: "id",
            value: raw_id,
        })?;
        let version = Version::initial();

        let record = Arc::new(CounterRecord {
            committed: Mutex::new(CommittedState {
                value: initial,
                version,
            }),
            row_lock: tokio::sync::Mutex::new(()),
        });
        self.counters.write().insert(id, record);
        self.history.lock().push(CommittedWrite {
            counter_id: id,
            value: initial,
            version,
        });

        Ok(Counter {
            id,
            name,
            value: initial,
            version,
        })
    }

    async fn read(&self, id: CounterId) -> StoreResult<CounterSnapshot> {
        let record = self.record(id)?;
        let state = *record.committed.lock();
        Ok(CounterSnapshot {
            id,
            value: state.value,
            version: state.version,
        })
    }

    async fn conditional_write(
        &self,
        id: CounterId,
        expected: Version,
        new_value: StockLevel,
    ) -> StoreResult<u64> {
        let record = self.record(id)?;
        let _row = record.row_lock.lock().await;

        let mut state = record.committed.lock();
        if state.version != expected {
            trace!(counter_id = %id, %expected, actual = %state.version, "stale version");
            return Ok(0);
        }
        self.commit(id, &mut state, new_value);
        Ok(1)
    }

    async fn with_exclusive_lock(
        &self,
        id: CounterId,
        section: &dyn CriticalSection,
    ) -> StoreResult<LockDecision> {
        let record = self.record(id)?;
        let _row = record.row_lock.lock().await;

        let locked = {
            let state = record.committed.lock();
            CounterSnapshot {
                id,
                value: state.value,
                version: state.version,
            }
        };

        let decision = section.run(locked).await;
        if let LockDecision::Commit { new_value } = decision {
            let mut state = record.committed.lock();
            self.commit(id, &mut state, new_value);
        }
        Ok(decision)
    }
}
