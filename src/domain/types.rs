//! Validated newtypes for the stock counter domain
//!
//! Every quantity that has a legal range gets its own type so that a
//! negative stock level or a zero-sized reservation cannot be constructed.

use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// Identifier of a persisted counter row
#[nutype(
    validate(greater = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct CounterId(i64);

/// Human readable label of the stocked item
///
/// Limited to 255 characters to fit a plain `TEXT` index comfortably.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct CounterName(String);

/// Available quantity held by a counter. Never negative.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct StockLevel(i64);

impl StockLevel {
    /// The level left after taking `quantity` units, or `None` if that
    /// would go below zero
    pub fn reserve(self, quantity: Quantity) -> Option<StockLevel> {
        self.into_inner()
            .checked_sub(quantity.into_inner())
            .and_then(|remaining| StockLevel::try_new(remaining).ok())
    }
}

/// Number of units a single worker asks for
#[nutype(
    validate(greater = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct Quantity(i64);

/// Monotonic version tag, bumped by every committed write
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRef,
    Display
))]
pub struct Version(i64);

impl Version {
    pub fn initial() -> Self {
        Self::new(0)
    }

    pub fn next(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

/// Diagnostic identifier of a worker, numbered from 1 by the pool
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRef,
    Display
))]
pub struct WorkerId(u32);

/// Number of concurrent workers spawned for a run
#[nutype(
    validate(greater = 0, less_or_equal = 10_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct WorkerCount(u32);

/// Upper bound on optimistic attempts per reservation
#[nutype(
    validate(greater = 0, less_or_equal = 1_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct MaxAttempts(u32);

impl Default for MaxAttempts {
    fn default() -> Self {
        Self::try_new(2).expect("Default attempt cap is valid")
    }
}
