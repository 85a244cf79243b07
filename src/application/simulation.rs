//! Store-agnostic run orchestration
//!
//! Seeds the counter, builds the controller for the selected strategy, drives
//! the worker pool and reads back the final counter state.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::counter_store::CounterStore;
use super::optimistic::{OptimisticController, RetryPolicy};
use super::pessimistic::PessimisticController;
use super::reservation::ReservationController;
use super::work::{SleepingWork, WorkSimulator};
use super::worker_pool::{RunReport, WorkerPool};
use crate::config::RunSettings;
use crate::domain::{
    Counter, CounterName, CounterSnapshot, Quantity, StockLevel, Strategy, WorkerCount,
};
use crate::infrastructure::log_messages::application as msg;
use crate::Result;

/// Everything one run needs, in domain types
#[derive(Debug, Clone)]
pub struct RunParameters {
    pub strategy: Strategy,
    pub counter_name: CounterName,
    pub initial_stock: StockLevel,
    pub worker_count: WorkerCount,
    pub quantity: Quantity,
    pub retry: RetryPolicy,
    pub work_delay: Duration,
}

impl From<&RunSettings> for RunParameters {
    fn from(settings: &RunSettings) -> Self {
        Self {
            strategy: settings.strategy,
            counter_name: settings.counter_name.clone(),
            initial_stock: settings.initial_stock,
            worker_count: settings.worker_count,
            quantity: settings.quantity,
            retry: RetryPolicy {
                max_attempts: settings.max_attempts,
                backoff: settings.backoff_ms.as_duration(),
            },
            work_delay: settings.work_delay_ms.as_duration(),
        }
    }
}

/// The seeded counter, the final state and every worker's outcome
#[derive(Debug)]
pub struct SimulationResult {
    pub counter: Counter,
    pub final_state: CounterSnapshot,
    pub report: RunReport,
}

pub struct Simulation<S: ?Sized> {
    store: Arc<S>,
    params: RunParameters,
    work: Arc<dyn WorkSimulator>,
}

impl<S> Simulation<S>
where
    S: CounterStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, params: RunParameters) -> Self {
        let work = Arc::new(SleepingWork::new(params.work_delay));
        Self {
            store,
            params,
            work,
        }
    }

    /// Replace the default sleeping work window
    pub fn with_work(mut self, work: Arc<dyn WorkSimulator>) -> Self {
        self.work = work;
        self
    }

    /// The controller for the configured strategy
    pub fn controller(&self) -> Arc<dyn ReservationController> {
        match self.params.strategy {
            Strategy::Optimistic => Arc::new(OptimisticController::new(
                Arc::clone(&self.store),
                self.params.retry,
                Arc::clone(&self.work),
            )),
            Strategy::Pessimistic => Arc::new(PessimisticController::new(
                Arc::clone(&self.store),
                Arc::clone(&self.work),
            )),
        }
    }

    #[instrument(skip_all, fields(strategy = %self.params.strategy))]
    pub async fn run(&self) -> Result<SimulationResult> {
        let counter = self
            .store
            .create_counter(self.params.counter_name.clone(), self.params.initial_stock)
            .await?;
        info!(
            counter_id = %counter.id,
            name = %counter.name,
            stock = %counter.value,
            "{}",
            msg::RUNNING_STRATEGY
        );

        let pool = WorkerPool::new(self.controller(), self.params.worker_count);
        let report = pool.run(counter.id, self.params.quantity).await;
        let final_state = self.store.read(counter.id).await?;

        Ok(SimulationResult {
            counter,
            final_state,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::work::NoWork;
    use crate::domain::MaxAttempts;
    use crate::infrastructure::memory_store::InMemoryCounterStore;

    fn params(strategy: Strategy) -> RunParameters {
        RunParameters {
            strategy,
            counter_name: CounterName::try_new("Sugar".to_string()).unwrap(),
            initial_stock: StockLevel::try_new(3).unwrap(),
            worker_count: WorkerCount::try_new(5).unwrap(),
            quantity: Quantity::try_new(1).unwrap(),
            retry: RetryPolicy {
                max_attempts: MaxAttempts::try_new(4).unwrap(),
                backoff: Duration::ZERO,
            },
            work_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_controller_follows_strategy() {
        let store = Arc::new(InMemoryCounterStore::new());
        for strategy in [Strategy::Optimistic, Strategy::Pessimistic] {
            let simulation = Simulation::new(store.clone(), params(strategy));
            assert_eq!(simulation.controller().strategy(), strategy);
        }
    }

    #[tokio::test]
    async fn test_run_seeds_drives_and_reads_back() {
        let store = Arc::new(InMemoryCounterStore::new());
        let result = Simulation::new(store.clone(), params(Strategy::Pessimistic))
            .with_work(Arc::new(NoWork))
            .run()
            .await
            .unwrap();

        assert_eq!(result.counter.value.into_inner(), 3);
        assert_eq!(result.final_state.value.into_inner(), 0);
        assert_eq!(result.report.successes(), 3);
        assert_eq!(result.report.workers.len(), 5);
        assert_eq!(store.applied_writes(), 3);
    }

    #[test]
    fn test_parameters_from_settings() {
        let settings = crate::config::Settings::new().unwrap();
        let params = RunParameters::from(&settings.run);

        assert_eq!(params.retry.max_attempts, settings.run.max_attempts);
        assert_eq!(params.work_delay, settings.run.work_delay_ms.as_duration());
        assert_eq!(params.retry.backoff, settings.run.backoff_ms.as_duration());
    }
}
