use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted optimize invocation and its paywall status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OptimizationRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub original_filename: String,
    pub html_content: String,
    pub is_paid: bool,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a record.
#[derive(Debug, Clone)]
pub struct NewOptimization {
    pub owner_id: String,
    pub original_filename: String,
    pub html_content: String,
    pub is_paid: bool,
}

/// History listing entry. The HTML body stays out of list payloads.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationSummary {
    pub id: Uuid,
    pub original_filename: String,
    pub is_paid: bool,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<&OptimizationRecord> for OptimizationSummary {
    fn from(record: &OptimizationRecord) -> Self {
        Self {
            id: record.id,
            original_filename: record.original_filename.clone(),
            is_paid: record.is_paid,
            order_number: record.order_number.clone(),
            created_at: record.created_at,
        }
    }
}
