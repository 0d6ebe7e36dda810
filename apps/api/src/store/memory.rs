use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{generate_order_number, RecordStore, StoreError};
use crate::models::optimization::{NewOptimization, OptimizationRecord};

/// In-process record store. Used when no database is configured, and by tests.
/// Records are kept in insertion order, which is also `created_at` order.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<OptimizationRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, new: NewOptimization) -> Result<OptimizationRecord, StoreError> {
        let now = Utc::now();
        let record = OptimizationRecord {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            original_filename: new.original_filename,
            html_content: new.html_content,
            is_paid: new.is_paid,
            order_number: generate_order_number(now),
            created_at: now,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_recent(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<Option<OptimizationRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.owner_id == owner_id && r.original_filename == filename)
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OptimizationRecord>, StoreError> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn mark_paid(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.is_paid = true;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OptimizationRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<OptimizationRecord>, StoreError> {
        Ok(self.records.read().await.iter().rev().cloned().collect())
    }
}
