use serde::{Deserialize, Serialize};

use super::types::{CounterId, CounterName, StockLevel, Version};

/// The shared stock counter as persisted by a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: CounterId,
    pub name: CounterName,
    pub value: StockLevel,
    pub version: Version,
}

/// Value and version of a counter as observed at one instant
///
/// Outside a locked transaction this may be stale as soon as it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub id: CounterId,
    pub value: StockLevel,
    pub version: Version,
}
