//! Optimistic controller under forced races
//!
//! Store doubles and work hooks pin the interleaving so that lost-update
//! protection and retry exhaustion are checked deterministically.

mod common;

use async_trait::async_trait;
use parking_lot::Mutex;
use rstest::rstest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stock_guard::application::{
    CounterStore, CriticalSection, LockDecision, NoWork, OptimisticController,
    ReservationController, ReservationOutcome, ReservationRequest, RetryPolicy, StoreResult,
    WorkSimulator, WorkWindow,
};
use stock_guard::domain::{
    Counter, CounterId, CounterName, CounterSnapshot, MaxAttempts, StockLevel, Version, WorkerId,
};
use stock_guard::infrastructure::InMemoryCounterStore;
use tokio::sync::{watch, Barrier};

use common::{quantity, seeded_store, stock};

/// Delegates to an in-memory store and records every conditional write
struct RecordingStore {
    inner: Arc<InMemoryCounterStore>,
    writes: Mutex<Vec<(Version, u64)>>,
    completed: watch::Sender<usize>,
}

impl RecordingStore {
    fn new(inner: Arc<InMemoryCounterStore>) -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
            completed,
        }
    }
}

#[async_trait]
impl CounterStore for RecordingStore {
    async fn create_counter(&self, name: CounterName, initial: StockLevel) -> StoreResult<Counter> {
        self.inner.create_counter(name, initial).await
    }

    async fn read(&self, id: CounterId) -> StoreResult<CounterSnapshot> {
        self.inner.read(id).await
    }

    async fn conditional_write(
        &self,
        id: CounterId,
        expected: Version,
        new_value: StockLevel,
    ) -> StoreResult<u64> {
        let rows = self.inner.conditional_write(id, expected, new_value).await?;
        self.writes.lock().push((expected, rows));
        self.completed.send_modify(|count| *count += 1);
        Ok(rows)
    }

    async fn with_exclusive_lock(
        &self,
        id: CounterId,
        section: &dyn CriticalSection,
    ) -> StoreResult<LockDecision> {
        self.inner.with_exclusive_lock(id, section).await
    }
}

/// Lets both workers read before either writes, then holds worker 2 back
/// until worker 1's write has completed
struct ForcedRace {
    both_read: Barrier,
    store: Arc<RecordingStore>,
    observed: Mutex<Vec<(u32, u32, i64, i64)>>,
}

#[async_trait]
impl WorkSimulator for ForcedRace {
    async fn simulate(&self, window: &WorkWindow) {
        let worker = window.worker_id.into_inner();
        self.observed.lock().push((
            worker,
            window.attempt,
            window.snapshot.value.into_inner(),
            window.snapshot.version.into_inner(),
        ));

        if window.attempt == 1 {
            self.both_read.wait().await;
            if worker == 2 {
                let mut completed = self.store.completed.subscribe();
                completed
                    .wait_for(|count| *count >= 1)
                    .await
                    .expect("store outlives the race");
            }
        }
    }
}

fn request(counter_id: CounterId, worker: u32) -> ReservationRequest {
    ReservationRequest {
        counter_id,
        quantity: quantity(1),
        worker_id: WorkerId::new(worker),
    }
}

#[tokio::test]
async fn test_stale_write_is_rejected_and_loser_retries_from_fresh_state() {
    let (inner, counter_id) = seeded_store(10).await;
    let store = Arc::new(RecordingStore::new(inner.clone()));
    let hook = Arc::new(ForcedRace {
        both_read: Barrier::new(2),
        store: store.clone(),
        observed: Mutex::new(Vec::new()),
    });
    let controller = OptimisticController::new(
        store.clone(),
        RetryPolicy {
            max_attempts: MaxAttempts::try_new(2).unwrap(),
            backoff: Duration::ZERO,
        },
        hook.clone(),
    );

    let (first, second) = tokio::join!(
        controller.reserve(request(counter_id, 1)),
        controller.reserve(request(counter_id, 2)),
    );

    // Worker 1 wrote against version 0; worker 2's write against the same
    // version found zero rows, then succeeded against version 1.
    let writes: Vec<(i64, u64)> = store
        .writes
        .lock()
        .iter()
        .map(|(version, rows)| (version.into_inner(), *rows))
        .collect();
    assert_eq!(writes, vec![(0, 1), (0, 0), (1, 1)]);

    assert_eq!(first.remaining(), Some(stock(9)));
    assert_eq!(second.remaining(), Some(stock(8)));

    let second_worker_views: Vec<(u32, i64, i64)> = hook
        .observed
        .lock()
        .iter()
        .filter(|(worker, ..)| *worker == 2)
        .map(|(_, attempt, value, version)| (*attempt, *value, *version))
        .collect();
    assert_eq!(second_worker_views, vec![(1, 10, 0), (2, 9, 1)]);

    let snapshot = inner.read(counter_id).await.unwrap();
    assert_eq!(snapshot.value, stock(8));
    assert_eq!(snapshot.version.into_inner(), 2);
}

/// Always hands out the same snapshot and never lets a write through
struct AlwaysStaleStore {
    inner: Arc<InMemoryCounterStore>,
    attempts: AtomicU64,
}

#[async_trait]
impl CounterStore for AlwaysStaleStore {
    async fn create_counter(&self, name: CounterName, initial: StockLevel) -> StoreResult<Counter> {
        self.inner.create_counter(name, initial).await
    }

    async fn read(&self, id: CounterId) -> StoreResult<CounterSnapshot> {
        self.inner.read(id).await
    }

    async fn conditional_write(
        &self,
        _id: CounterId,
        _expected: Version,
        _new_value: StockLevel,
    ) -> StoreResult<u64> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn with_exclusive_lock(
        &self,
        id: CounterId,
        section: &dyn CriticalSection,
    ) -> StoreResult<LockDecision> {
        self.inner.with_exclusive_lock(id, section).await
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[tokio::test(start_paused = true)]
async fn test_exhausts_after_exactly_the_configured_attempts(#[case] cap: u32) {
    let (inner, counter_id) = seeded_store(10).await;
    let store = Arc::new(AlwaysStaleStore {
        inner: inner.clone(),
        attempts: AtomicU64::new(0),
    });
    let controller = OptimisticController::new(
        store.clone(),
        RetryPolicy {
            max_attempts: MaxAttempts::try_new(cap).unwrap(),
            backoff: Duration::from_millis(50),
        },
        Arc::new(NoWork),
    );

    let outcome = controller.reserve(request(counter_id, 1)).await;

    assert!(matches!(
        outcome,
        ReservationOutcome::ConflictExhausted { attempts } if attempts == cap
    ));
    assert_eq!(store.attempts.load(Ordering::SeqCst), u64::from(cap));
    assert_eq!(inner.applied_writes(), 0);
    assert_eq!(inner.read(counter_id).await.unwrap().value, stock(10));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_applied_between_attempts_only() {
    let (inner, counter_id) = seeded_store(10).await;
    let store = Arc::new(AlwaysStaleStore {
        inner,
        attempts: AtomicU64::new(0),
    });
    let controller = OptimisticController::new(
        store,
        RetryPolicy {
            max_attempts: MaxAttempts::try_new(3).unwrap(),
            backoff: Duration::from_millis(50),
        },
        Arc::new(NoWork),
    );

    let start = tokio::time::Instant::now();
    controller.reserve(request(counter_id, 1)).await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(150), "{elapsed:?}");
}

/// Drains stock between the first read and the write
struct CompetingBuyer {
    store: Arc<InMemoryCounterStore>,
}

#[async_trait]
impl WorkSimulator for CompetingBuyer {
    async fn simulate(&self, window: &WorkWindow) {
        if window.attempt == 1 {
            let rows = self
                .store
                .conditional_write(window.snapshot.id, window.snapshot.version, stock(0))
                .await
                .unwrap();
            assert_eq!(rows, 1);
        }
    }
}

#[tokio::test]
async fn test_retry_that_finds_stock_gone_reports_insufficient_stock() {
    let (store, counter_id) = seeded_store(1).await;
    let controller = OptimisticController::new(
        store.clone(),
        RetryPolicy {
            max_attempts: MaxAttempts::try_new(3).unwrap(),
            backoff: Duration::ZERO,
        },
        Arc::new(CompetingBuyer {
            store: store.clone(),
        }),
    );

    let outcome = controller.reserve(request(counter_id, 1)).await;

    assert!(matches!(
        outcome,
        ReservationOutcome::InsufficientStock { available } if available == stock(0)
    ));
    assert_eq!(store.applied_writes(), 1);
}
