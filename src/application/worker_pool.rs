//! Worker pool driver
//!
//! Spawns one tokio task per worker against a single counter, waits for all
//! of them, and reports every worker's outcome. A failed or panicked worker
//! never cancels the others.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, instrument, Instrument};

use super::counter_store::StoreError;
use super::reservation::{
    OutcomeKind, ReservationController, ReservationOutcome, ReservationRequest,
};
use crate::domain::{CounterId, Quantity, RunId, Strategy, WorkerCount, WorkerId};
use crate::infrastructure::log_messages::worker_pool as msg;

pub struct WorkerPool {
    controller: Arc<dyn ReservationController>,
    worker_count: WorkerCount,
}

impl WorkerPool {
    pub fn new(controller: Arc<dyn ReservationController>, worker_count: WorkerCount) -> Self {
        Self {
            controller,
            worker_count,
        }
    }

    /// Run every worker once against `counter_id` and collect the outcomes
    #[instrument(
        skip_all,
        fields(strategy = %self.controller.strategy(), workers = %self.worker_count, counter_id = %counter_id)
    )]
    pub async fn run(&self, counter_id: CounterId, quantity: Quantity) -> RunReport {
        let run_id = RunId::generate();
        let started_at = Utc::now();
        let worker_count = self.worker_count.into_inner();
        info!(%run_id, "{}", msg::SPAWNING_WORKERS);

        let mut handles = Vec::with_capacity(worker_count as usize);
        for n in 1..=worker_count {
            let worker_id = WorkerId::new(n);
            let controller = Arc::clone(&self.controller);
            let request = ReservationRequest {
                counter_id,
                quantity,
                worker_id,
            };

            let handle = tokio::spawn(
                async move { controller.reserve(request).await }
                    .instrument(info_span!("worker", worker_id = %worker_id)),
            );
            handles.push((worker_id, handle));
        }

        let mut workers = Vec::with_capacity(handles.len());
        for (worker_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!(%worker_id, error = %join_error, "{}", msg::WORKER_TASK_FAILED);
                    ReservationOutcome::StoreError(StoreError::Aborted(join_error.to_string()))
                }
            };
            workers.push(WorkerReport { worker_id, outcome });
        }

        RunReport {
            run_id,
            strategy: self.controller.strategy(),
            counter_id,
            quantity,
            started_at,
            finished_at: Utc::now(),
            workers,
        }
    }
}

/// One worker's final outcome
#[derive(Debug)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub outcome: ReservationOutcome,
}

/// Every worker's outcome for one run, in worker order
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub strategy: Strategy,
    pub counter_id: CounterId,
    pub quantity: Quantity,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: Vec<WorkerReport>,
}

/// Aggregate counts of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub strategy: Strategy,
    pub workers: usize,
    pub successes: usize,
    pub insufficient_stock: usize,
    pub conflict_exhausted: usize,
    pub store_errors: usize,
    pub units_reserved: i64,
    pub elapsed_ms: i64,
}

impl RunReport {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.workers
            .iter()
            .filter(|worker| worker.outcome.kind() == kind)
            .count()
    }

    pub fn successes(&self) -> usize {
        self.count(OutcomeKind::Success)
    }

    /// Total units taken by successful workers
    pub fn units_reserved(&self) -> i64 {
        self.successes() as i64 * self.quantity.into_inner()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            strategy: self.strategy,
            workers: self.workers.len(),
            successes: self.successes(),
            insufficient_stock: self.count(OutcomeKind::InsufficientStock),
            conflict_exhausted: self.count(OutcomeKind::ConflictExhausted),
            store_errors: self.count(OutcomeKind::StoreError),
            units_reserved: self.units_reserved(),
            elapsed_ms: (self.finished_at - self.started_at).num_milliseconds(),
        }
    }

    /// Emit one line per worker followed by the summary
    pub fn log(&self) {
        for worker in &self.workers {
            info!(
                run_id = %self.run_id,
                worker_id = %worker.worker_id,
                outcome = ?worker.outcome.kind(),
                detail = %worker.outcome,
                "{}",
                msg::WORKER_OUTCOME
            );
        }

        let summary = self.summary();
        info!(
            run_id = %summary.run_id,
            strategy = %summary.strategy,
            successes = summary.successes,
            insufficient_stock = summary.insufficient_stock,
            conflict_exhausted = summary.conflict_exhausted,
            store_errors = summary.store_errors,
            units_reserved = summary.units_reserved,
            elapsed_ms = summary.elapsed_ms,
            "{}",
            msg::RUN_SUMMARY
        );
    }
}
