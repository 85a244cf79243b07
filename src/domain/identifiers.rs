//! Identifiers for reservation runs
//!
//! A run id is a UUID v7 so that log lines and reports from successive runs
//! sort by start time.

use nutype::nutype;
use uuid::Uuid;

/// Unique identifier for one execution of the worker pool
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::generate()
    }
}
