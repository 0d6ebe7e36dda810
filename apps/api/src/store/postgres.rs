use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{generate_order_number, RecordStore, StoreError};
use crate::models::optimization::{NewOptimization, OptimizationRecord};

/// PostgreSQL-backed record store (table `optimizations`).
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, new: NewOptimization) -> Result<OptimizationRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, OptimizationRecord>(
            r#"
            INSERT INTO optimizations
                (id, owner_id, original_filename, html_content, is_paid, order_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.owner_id)
        .bind(&new.original_filename)
        .bind(&new.html_content)
        .bind(new.is_paid)
        .bind(generate_order_number(now))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Stored optimization {} ({}) for owner {}",
            record.id, record.order_number, record.owner_id
        );
        Ok(record)
    }

    async fn find_recent(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<Option<OptimizationRecord>, StoreError> {
        Ok(sqlx::query_as::<_, OptimizationRecord>(
            r#"
            SELECT * FROM optimizations
            WHERE owner_id = $1 AND original_filename = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OptimizationRecord>, StoreError> {
        Ok(
            sqlx::query_as::<_, OptimizationRecord>("SELECT * FROM optimizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn mark_paid(&self, id: Uuid) -> Result<(), StoreError> {
        // Monotonic: the flag only ever moves to TRUE.
        let result = sqlx::query("UPDATE optimizations SET is_paid = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OptimizationRecord>, StoreError> {
        Ok(sqlx::query_as::<_, OptimizationRecord>(
            "SELECT * FROM optimizations WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_all(&self) -> Result<Vec<OptimizationRecord>, StoreError> {
        Ok(sqlx::query_as::<_, OptimizationRecord>(
            "SELECT * FROM optimizations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
