//! Reservation controllers and run orchestration
//!
//! This module contains the concurrency-control strategies, the store seam
//! they depend on, and the worker pool that drives them.

pub mod app;
pub mod counter_store;
pub mod optimistic;
pub mod pessimistic;
pub mod reservation;
pub mod simulation;
pub mod work;
pub mod worker_pool;

pub use app::Application;
pub use counter_store::{
    CounterStore, CriticalSection, LockDecision, StoreError, StoreResult,
};
pub use optimistic::{OptimisticController, RetryPolicy};
pub use pessimistic::PessimisticController;
pub use reservation::{OutcomeKind, ReservationController, ReservationOutcome, ReservationRequest};
pub use simulation::{RunParameters, Simulation, SimulationResult};
pub use work::{NoWork, SleepingWork, WorkSimulator, WorkWindow};
pub use worker_pool::{RunReport, RunSummary, WorkerPool, WorkerReport};
