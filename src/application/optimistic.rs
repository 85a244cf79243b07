//! Optimistic reservation: read, work, then write only if nobody else did
//!
//! The version read in step one is the precondition of the conditional
//! write. Two writers that read the same version cannot both succeed, so an
//! update is never lost; the loser re-reads and tries again until the retry
//! budget runs out.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::counter_store::CounterStore;
use super::reservation::{ReservationController, ReservationOutcome, ReservationRequest};
use super::work::{WorkSimulator, WorkWindow};
use crate::domain::{MaxAttempts, Strategy};
use crate::infrastructure::log_messages::reservation as msg;

/// Bounded retry policy for version conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: MaxAttempts,
    /// Pause between a lost race and the next read
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MaxAttempts::default(),
            backoff: Duration::from_millis(50),
        }
    }
}

pub struct OptimisticController<S: ?Sized> {
    store: Arc<S>,
    policy: RetryPolicy,
    work: Arc<dyn WorkSimulator>,
}

impl<S> OptimisticController<S>
where
    S: CounterStore + ?Sized,
{
    pub fn new(store: Arc<S>, policy: RetryPolicy, work: Arc<dyn WorkSimulator>) -> Self {
        Self {
            store,
            policy,
            work,
        }
    }
}

#[async_trait]
impl<S> ReservationController for OptimisticController<S>
where
    S: CounterStore + ?Sized,
{
    fn strategy(&self) -> Strategy {
        Strategy::Optimistic
    }

    #[instrument(
        skip_all,
        fields(worker_id = %request.worker_id, counter_id = %request.counter_id, quantity = %request.quantity)
    )]
    async fn reserve(&self, request: ReservationRequest) -> ReservationOutcome {
        let max_attempts = self.policy.max_attempts.into_inner();

        for attempt in 1..=max_attempts {
            let snapshot = match self.store.read(request.counter_id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(attempt, error = %err, "{}", msg::STORE_FAILURE);
                    return ReservationOutcome::StoreError(err);
                }
            };

            let Some(remaining) = snapshot.value.reserve(request.quantity) else {
                info!(available = %snapshot.value, "{}", msg::NOT_ENOUGH_STOCK);
                return ReservationOutcome::InsufficientStock {
                    available: snapshot.value,
                };
            };

            self.work
                .simulate(&WorkWindow {
                    worker_id: request.worker_id,
                    strategy: Strategy::Optimistic,
                    attempt,
                    snapshot,
                })
                .await;

            match self
                .store
                .conditional_write(request.counter_id, snapshot.version, remaining)
                .await
            {
                Ok(0) => {
                    debug!(attempt, expected_version = %snapshot.version, "{}", msg::CONFLICT_RETRYING);
                    if attempt < max_attempts && !self.policy.backoff.is_zero() {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
                Ok(_) => {
                    info!(attempt, new_stock = %remaining, "{}", msg::UPDATE_SUCCESSFUL);
                    return ReservationOutcome::Success { remaining };
                }
                Err(err) => {
                    warn!(attempt, error = %err, "{}", msg::STORE_FAILURE);
                    return ReservationOutcome::StoreError(err);
                }
            }
        }

        warn!(attempts = max_attempts, "{}", msg::RETRIES_EXHAUSTED);
        ReservationOutcome::ConflictExhausted {
            attempts: max_attempts,
        }
    }
}
