//! Domain types for the stock counter
//!
//! This module contains the value types shared by the store, the
//! reservation controllers and the worker pool.

pub mod config_types;
pub mod counter;
pub mod identifiers;
pub mod strategy;
pub mod types;

pub use counter::*;
pub use identifiers::*;
pub use strategy::*;
pub use types::*;
