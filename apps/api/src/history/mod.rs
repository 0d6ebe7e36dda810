//! History: a signed-in owner's previous optimizations, newest first.

use tracing::warn;

use crate::models::optimization::OptimizationSummary;
use crate::store::RecordStore;

pub mod handlers;

/// An unavailable store reads as an empty history.
pub async fn list_history(store: &dyn RecordStore, owner_id: &str) -> Vec<OptimizationSummary> {
    match store.list_by_owner(owner_id).await {
        Ok(records) => records.iter().map(OptimizationSummary::from).collect(),
        Err(e) => {
            warn!("History for {owner_id} unavailable: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::optimization::NewOptimization;
    use crate::store::MemoryRecordStore;
    use crate::test_support::FailingStore;

    #[tokio::test]
    async fn test_history_is_newest_first_and_scoped_to_owner() {
        let store = MemoryRecordStore::new();
        for (owner, name) in [("u1", "a.pdf"), ("u2", "b.pdf"), ("u1", "c.pdf")] {
            store
                .create(NewOptimization {
                    owner_id: owner.into(),
                    original_filename: name.into(),
                    html_content: "<html/>".into(),
                    is_paid: false,
                })
                .await
                .unwrap();
        }

        let history = list_history(&store, "u1").await;
        let names: Vec<_> = history.iter().map(|s| s.original_filename.as_str()).collect();
        assert_eq!(names, vec!["c.pdf", "a.pdf"]);
    }

    #[tokio::test]
    async fn test_store_outage_reads_as_empty() {
        assert!(list_history(&FailingStore, "u1").await.is_empty());
    }
}
