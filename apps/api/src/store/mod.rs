//! Optimization Record Store — durable record of each optimize invocation.
//!
//! Writes are append-only (`create`) or a single idempotent flag flip
//! (`mark_paid`), so no transaction or locking discipline is needed.
//! Callers on the user-facing path treat `StoreError::Unavailable` as a
//! degradation, never as a pipeline failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::models::optimization::{NewOptimization, OptimizationRecord};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("optimization {0} not found")]
    NotFound(Uuid),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Carried in `AppState` as `Arc<dyn RecordStore>`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Allocates an id and order number, stamps `created_at`.
    async fn create(&self, new: NewOptimization) -> Result<OptimizationRecord, StoreError>;

    /// Most recently created record for (owner, filename), if any.
    async fn find_recent(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<Option<OptimizationRecord>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<OptimizationRecord>, StoreError>;

    /// Idempotent: marking an already-paid record is a successful no-op.
    async fn mark_paid(&self, id: Uuid) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OptimizationRecord>, StoreError>;

    /// Every record, newest first. Admin use only.
    async fn list_all(&self) -> Result<Vec<OptimizationRecord>, StoreError>;
}

/// Human-readable order reference: `ORD-` + last 6 digits of the millisecond
/// timestamp + 2 random uppercase alphanumerics.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs() % 1_000_000;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(2)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{millis:06}{suffix}")
}
