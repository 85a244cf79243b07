//! Simulated work between reading the counter and writing it back
//!
//! In production this window is where contention comes from. The optimistic
//! controller runs it with no lock held; the pessimistic controller runs it
//! while holding the row lock. Tests inject their own simulator to pause
//! workers at a precise point instead of relying on wall-clock sleeps.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{CounterSnapshot, Strategy, WorkerId};

/// Where a worker is when its work window opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkWindow {
    pub worker_id: WorkerId,
    pub strategy: Strategy,
    /// 1-based attempt number; always 1 for the pessimistic path
    pub attempt: u32,
    /// The value and version this attempt is working from
    pub snapshot: CounterSnapshot,
}

#[async_trait]
pub trait WorkSimulator: Send + Sync {
    async fn simulate(&self, window: &WorkWindow);
}

/// Sleeps for a fixed duration on the tokio timer
#[derive(Debug, Clone, Copy)]
pub struct SleepingWork {
    duration: Duration,
}

impl SleepingWork {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl WorkSimulator for SleepingWork {
    async fn simulate(&self, _window: &WorkWindow) {
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWork;

#[async_trait]
impl WorkSimulator for NoWork {
    async fn simulate(&self, _window: &WorkWindow) {}
}
