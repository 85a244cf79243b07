//! Log message constants
//!
//! Values are attached as structured `tracing` fields, so none of these
//! messages carry format placeholders.

/// Application startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting stock reservation run";
    pub const CONNECTING_TO_DATABASE: &str = "Connecting to database";
    pub const RUNNING_STRATEGY: &str = "Running locking example";
    pub const ALL_WORKERS_FINISHED: &str = "All workers finished";
}

/// Database-related log messages
pub mod database {
    pub const HEALTH_CHECK_FAILED: &str = "Database health check failed";
    pub const CONNECTION_ESTABLISHED: &str = "Database connection established";
    pub const SCHEMA_READY: &str = "Counter table is ready";
    pub const TABLE_RESET: &str = "Counter table truncated and identity restarted";
    pub const COUNTER_SEEDED: &str = "Counter seeded";
}

/// Per-attempt reservation messages
pub mod reservation {
    pub const LOCK_ACQUIRED: &str = "Acquired lock";
    pub const NOT_ENOUGH_STOCK: &str = "Not enough stock";
    pub const CONFLICT_RETRYING: &str = "Conflict detected (version mismatch), retrying";
    pub const UPDATE_SUCCESSFUL: &str = "Update successful";
    pub const ORDER_PROCESSED: &str = "Order processed";
    pub const RETRIES_EXHAUSTED: &str = "Failed to process order after multiple retries";
    pub const STORE_FAILURE: &str = "Store operation failed";
}

/// Worker pool messages
pub mod worker_pool {
    pub const SPAWNING_WORKERS: &str = "Spawning workers";
    pub const WORKER_TASK_FAILED: &str = "Worker task ended without an outcome";
    pub const WORKER_OUTCOME: &str = "Worker finished";
    pub const RUN_SUMMARY: &str = "Run summary";
}
