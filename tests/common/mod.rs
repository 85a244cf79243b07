//! Shared fixtures for the reservation integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stock_guard::application::{CounterStore, RetryPolicy, RunParameters, WorkSimulator, WorkWindow};
use stock_guard::domain::{
    CounterId, CounterName, MaxAttempts, Quantity, StockLevel, Strategy, WorkerCount,
};
use stock_guard::infrastructure::InMemoryCounterStore;

pub fn stock(n: i64) -> StockLevel {
    StockLevel::try_new(n).expect("stock must be non-negative")
}

pub fn quantity(n: i64) -> Quantity {
    Quantity::try_new(n).expect("quantity must be positive")
}

pub fn sugar() -> CounterName {
    CounterName::try_new("Sugar".to_string()).expect("valid name")
}

/// A fresh in-memory store holding one counter
pub async fn seeded_store(initial: i64) -> (Arc<InMemoryCounterStore>, CounterId) {
    let store = Arc::new(InMemoryCounterStore::new());
    let counter = store
        .create_counter(sugar(), stock(initial))
        .await
        .expect("seeding an in-memory counter cannot fail");
    (store, counter.id)
}

#[derive(Debug, Clone)]
pub struct RunShape {
    pub strategy: Strategy,
    pub initial_stock: i64,
    pub workers: u32,
    pub quantity: i64,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub work_delay: Duration,
}

impl RunShape {
    pub fn parameters(&self) -> RunParameters {
        RunParameters {
            strategy: self.strategy,
            counter_name: sugar(),
            initial_stock: stock(self.initial_stock),
            worker_count: WorkerCount::try_new(self.workers).expect("valid worker count"),
            quantity: quantity(self.quantity),
            retry: RetryPolicy {
                max_attempts: MaxAttempts::try_new(self.max_attempts).expect("valid cap"),
                backoff: self.backoff,
            },
            work_delay: self.work_delay,
        }
    }
}

/// Sleeps `base * (worker_id % 3 + 1)` so work windows overlap unevenly
pub struct StaggeredWork {
    pub base: Duration,
}

#[async_trait]
impl WorkSimulator for StaggeredWork {
    async fn simulate(&self, window: &WorkWindow) {
        let factor = window.worker_id.into_inner() % 3 + 1;
        tokio::time::sleep(self.base * factor).await;
    }
}
