//! PostgreSQL-backed counter store
//!
//! The optimistic primitive is a single `UPDATE ... WHERE version = $n`; the
//! pessimistic primitive is a transaction that reads the row with
//! `SELECT ... FOR UPDATE` and keeps it locked until commit or rollback.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, instrument};

use crate::application::counter_store::{
    CounterStore, CriticalSection, LockDecision, StoreError, StoreResult,
};
use crate::domain::{Counter, CounterId, CounterName, CounterSnapshot, StockLevel, Version};
use crate::infrastructure::log_messages::database as msg;

/// Counter store over a `stock_counters` table
#[derive(Clone)]
pub struct PostgresCounterStore {
    pool: PgPool,
}

impl PostgresCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the counter table if it does not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_counters (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                stock BIGINT NOT NULL CHECK (stock >= 0),
                version BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("{}", msg::SCHEMA_READY);
        Ok(())
    }

    /// Remove every counter and restart id numbering at 1
    pub async fn reset(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE TABLE stock_counters RESTART IDENTITY")
            .execute(&self.pool)
            .await?;

        info!("{}", msg::TABLE_RESET);
        Ok(())
    }
}

fn snapshot_from_row(row: &PgRow) -> StoreResult<CounterSnapshot> {
    let id: i64 = row.try_get("id")?;
    let stock: i64 = row.try_get("stock")?;
    let version: i64 = row.try_get("version")?;

    Ok(CounterSnapshot {
        id: CounterId::try_new(id).map_err(|_| StoreError::InvalidStoredValue {
            column: "id",
            value: id,
        })?,
        value: StockLevel::try_new(stock).map_err(|_| StoreError::InvalidStoredValue {
            column: "stock",
            value: stock,
        })?,
        version: Version::new(version),
    })
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    #[instrument(skip_all, fields(name = %name, initial = %initial))]
    async fn create_counter(
        &self,
        name: CounterName,
        initial: StockLevel,
    ) -> StoreResult<Counter> {
        let row = sqlx::query(
            r#"
            INSERT INTO stock_counters (name, stock, version)
            VALUES ($1, $2, 0)
            RETURNING id, stock, version
            "#,
        )
        .bind(name.as_ref())
        .bind(initial.into_inner())
        .fetch_one(&self.pool)
        .await?;

        let snapshot = snapshot_from_row(&row)?;
        info!(counter_id = %snapshot.id, "{}", msg::COUNTER_SEEDED);

        Ok(Counter {
            id: snapshot.id,
            name,
            value: snapshot.value,
            version: snapshot.version,
        })
    }

    async fn read(&self, id: CounterId) -> StoreResult<CounterSnapshot> {
        let row = sqlx::query("SELECT id, stock, version FROM stock_counters WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::CounterNotFound(id))?;

        snapshot_from_row(&row)
    }

    async fn conditional_write(
        &self,
        id: CounterId,
        expected: Version,
        new_value: StockLevel,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE stock_counters
            SET stock = $1, version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(new_value.into_inner())
        .bind(id.into_inner())
        .bind(expected.into_inner())
        .execute(&self.pool)
        .await?;

        debug!(counter_id = %id, %expected, rows = result.rows_affected(), "conditional write");
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, fields(counter_id = %id))]
    async fn with_exclusive_lock(
        &self,
        id: CounterId,
        section: &dyn CriticalSection,
    ) -> StoreResult<LockDecision> {
        let mut tx = self.pool.begin().await?;

        let row =
            sqlx::query("SELECT id, stock, version FROM stock_counters WHERE id = $1 FOR UPDATE")
                .bind(id.into_inner())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(StoreError::CounterNotFound(id));
        };
        let locked = snapshot_from_row(&row)?;

        let decision = section.run(locked).await;
        match decision {
            LockDecision::Commit { new_value } => {
                sqlx::query(
                    "UPDATE stock_counters SET stock = $1, version = version + 1 WHERE id = $2",
                )
                .bind(new_value.into_inner())
                .bind(id.into_inner())
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
            }
            LockDecision::Rollback { .. } => tx.rollback().await?,
        }

        Ok(decision)
    }
}
