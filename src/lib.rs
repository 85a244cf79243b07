//! Stock Guard - concurrency control for a shared stock counter
//!
//! Many workers race to reserve units of one persisted counter. Two
//! strategies keep the counter consistent: optimistic version checks with
//! bounded retries, and pessimistic row locking for the whole transaction.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::Application;
pub use error::{Error, Result};
