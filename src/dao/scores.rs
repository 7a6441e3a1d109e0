//! Gateway for the per-user best-score record at `users/{userId}`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dao::{
    document_store::{DocumentStore, paths},
    storage::{StorageError, StorageResult},
};

/// Persisted per-user score record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserScoreRecord {
    /// Best score across all sessions.
    #[serde(default)]
    pub highest_score: u32,
}

/// Data access for user score records.
#[derive(Clone)]
pub struct ScoreGateway {
    store: Arc<dyn DocumentStore>,
}

impl ScoreGateway {
    /// Wrap the shared document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read the user's best score, `0` when no record exists.
    pub async fn get_highest(&self, uid: &str) -> StorageResult<u32> {
        let Some(doc) = self.store.get_document(&paths::user(uid)).await? else {
            return Ok(0);
        };
        let record: UserScoreRecord = serde_json::from_value(doc.data)
            .map_err(|source| StorageError::codec(paths::user(uid), source))?;
        Ok(record.highest_score)
    }

    /// Merge-write `candidate` as the user's best score when it beats the
    /// stored value. Sibling fields on the record are left untouched.
    ///
    /// The read-compare-write sequence is not atomic against a concurrent
    /// writer from another device; a single writer per game-end is assumed.
    /// Returns whether a write was issued.
    pub async fn set_highest_if_greater(&self, uid: &str, candidate: u32) -> StorageResult<bool> {
        if candidate <= self.get_highest(uid).await? {
            return Ok(false);
        }

        self.store
            .set_document(
                &paths::user(uid),
                serde_json::json!({ "highestScore": candidate }),
                true,
            )
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::dao::memory::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn absent_record_reads_as_zero() {
        let gateway = ScoreGateway::new(Arc::new(MemoryStore::new()));
        assert_eq!(gateway.get_highest("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stored_value_is_max_over_all_candidates() {
        let gateway = ScoreGateway::new(Arc::new(MemoryStore::new()));

        for candidate in [3, 1, 7, 7, 4] {
            gateway.set_highest_if_greater("u1", candidate).await.unwrap();
        }

        assert_eq!(gateway.get_highest("u1").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn lower_candidate_issues_no_write() {
        let gateway = ScoreGateway::new(Arc::new(MemoryStore::new()));

        assert!(gateway.set_highest_if_greater("u1", 5).await.unwrap());
        assert!(!gateway.set_highest_if_greater("u1", 2).await.unwrap());
        assert_eq!(gateway.get_highest("u1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn merge_write_preserves_sibling_fields() {
        let store = Arc::new(MemoryStore::new());
        let gateway = ScoreGateway::new(store.clone());

        use crate::dao::document_store::DocumentStore as _;
        store
            .set_document("users/u1", json!({"displayName": "ada"}), false)
            .await
            .unwrap();

        gateway.set_highest_if_greater("u1", 9).await.unwrap();

        let doc = store.get_document("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.data["displayName"], json!("ada"));
        assert_eq!(doc.data["highestScore"], json!(9));
    }
}
