//! Reservation requests, outcomes and the controller seam
//!
//! A controller turns one `ReservationRequest` into exactly one
//! `ReservationOutcome`. Failures are values, so the worker pool can collect
//! every worker's result without one failure cancelling the others.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use super::counter_store::StoreError;
use crate::domain::{CounterId, Quantity, StockLevel, Strategy, WorkerId};

/// One worker's intent to take `quantity` units from a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReservationRequest {
    pub counter_id: CounterId,
    pub quantity: Quantity,
    /// Diagnostics only
    pub worker_id: WorkerId,
}

/// Final result of a single reservation
#[derive(Debug)]
pub enum ReservationOutcome {
    /// The decrement committed; `remaining` is the value this worker wrote
    Success { remaining: StockLevel },
    /// Not enough stock at the time of the read. Never retried.
    InsufficientStock { available: StockLevel },
    /// Every optimistic attempt lost the version race
    ConflictExhausted { attempts: u32 },
    /// The store failed; nothing was committed by this attempt
    StoreError(StoreError),
}

/// Outcome discriminant, for counting and matching without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    InsufficientStock,
    ConflictExhausted,
    StoreError,
}

impl ReservationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ReservationOutcome::Success { .. } => OutcomeKind::Success,
            ReservationOutcome::InsufficientStock { .. } => OutcomeKind::InsufficientStock,
            ReservationOutcome::ConflictExhausted { .. } => OutcomeKind::ConflictExhausted,
            ReservationOutcome::StoreError(_) => OutcomeKind::StoreError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReservationOutcome::Success { .. })
    }

    /// The counter value this worker left behind, if it succeeded
    pub fn remaining(&self) -> Option<StockLevel> {
        match self {
            ReservationOutcome::Success { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

impl fmt::Display for ReservationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationOutcome::Success { remaining } => {
                write!(f, "success, new stock {remaining}")
            }
            ReservationOutcome::InsufficientStock { available } => {
                write!(f, "insufficient stock ({available} available)")
            }
            ReservationOutcome::ConflictExhausted { attempts } => {
                write!(f, "gave up after {attempts} conflicting attempts")
            }
            ReservationOutcome::StoreError(err) => write!(f, "store error: {err}"),
        }
    }
}

/// A concurrency-control strategy for reserving stock
#[async_trait]
pub trait ReservationController: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn reserve(&self, request: ReservationRequest) -> ReservationOutcome;
}
