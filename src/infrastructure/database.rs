use crate::config::DatabaseSettings;
use crate::infrastructure::log_messages::database as msg;
use crate::infrastructure::postgres_store::PostgresCounterStore;
use crate::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

/// Database connection pool wrapper
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized by `max_connections`
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.into_inner())
            .connect(&settings.url())
            .await?;

        info!(host = %settings.host, database = %settings.database_name, "{}", msg::CONNECTION_ESTABLISHED);
        Ok(Self::new(pool))
    }

    /// A counter store sharing this pool
    pub fn counter_store(&self) -> PostgresCounterStore {
        PostgresCounterStore::new(self.pool.clone())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pool)
            .await?;

        let health_check: i32 = row.try_get("health_check")?;

        if health_check == 1 {
            Ok(())
        } else {
            Err(Error::application(msg::HEALTH_CHECK_FAILED))
        }
    }
}
