//! Pessimistic reservation: serialize access with an exclusive row lock
//!
//! The whole read-check-write, including the simulated work, runs inside one
//! locked transaction. Competing workers block on the lock before they can
//! read, so there is nothing to detect or retry.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::counter_store::{CounterStore, CriticalSection, LockDecision};
use super::reservation::{ReservationController, ReservationOutcome, ReservationRequest};
use super::work::{WorkSimulator, WorkWindow};
use crate::domain::{CounterSnapshot, Strategy};
use crate::infrastructure::log_messages::reservation as msg;

pub struct PessimisticController<S: ?Sized> {
    store: Arc<S>,
    work: Arc<dyn WorkSimulator>,
}

impl<S> PessimisticController<S>
where
    S: CounterStore + ?Sized,
{
    pub fn new(store: Arc<S>, work: Arc<dyn WorkSimulator>) -> Self {
        Self { store, work }
    }
}

/// Runs under the row lock on behalf of one request
struct ReserveUnderLock {
    request: ReservationRequest,
    work: Arc<dyn WorkSimulator>,
}

#[async_trait]
impl CriticalSection for ReserveUnderLock {
    async fn run(&self, locked: CounterSnapshot) -> LockDecision {
        info!(current_stock = %locked.value, version = %locked.version, "{}", msg::LOCK_ACQUIRED);

        self.work
            .simulate(&WorkWindow {
                worker_id: self.request.worker_id,
                strategy: Strategy::Pessimistic,
                attempt: 1,
                snapshot: locked,
            })
            .await;

        match locked.value.reserve(self.request.quantity) {
            Some(new_value) => LockDecision::Commit { new_value },
            None => LockDecision::Rollback {
                observed: locked.value,
            },
        }
    }
}

#[async_trait]
impl<S> ReservationController for PessimisticController<S>
where
    S: CounterStore + ?Sized,
{
    fn strategy(&self) -> Strategy {
        Strategy::Pessimistic
    }

    #[instrument(
        skip_all,
        fields(worker_id = %request.worker_id, counter_id = %request.counter_id, quantity = %request.quantity)
    )]
    async fn reserve(&self, request: ReservationRequest) -> ReservationOutcome {
        let section = ReserveUnderLock {
            request,
            work: Arc::clone(&self.work),
        };

        match self
            .store
            .with_exclusive_lock(request.counter_id, &section)
            .await
        {
            Ok(LockDecision::Commit { new_value }) => {
                info!(new_stock = %new_value, "{}", msg::ORDER_PROCESSED);
                ReservationOutcome::Success {
                    remaining: new_value,
                }
            }
            Ok(LockDecision::Rollback { observed }) => {
                info!(available = %observed, "{}", msg::NOT_ENOUGH_STOCK);
                ReservationOutcome::InsufficientStock {
                    available: observed,
                }
            }
            Err(err) => {
                warn!(error = %err, "{}", msg::STORE_FAILURE);
                ReservationOutcome::StoreError(err)
            }
        }
    }
}
