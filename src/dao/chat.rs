//! Repository for the append-only chat log at `rooms/{roomId}/messages`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::{
    document_store::{
        CollectionQuery, Direction, DocumentStore, StoredDocument, Subscription, WatchTarget,
        paths,
    },
    storage::{StorageError, StorageResult},
};

/// Persisted representation of one chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEntity {
    /// Message body.
    pub text: String,
    /// Uid of the author.
    pub user_id: String,
    /// Display name of the author at posting time.
    pub username: String,
    /// Server-assigned timestamp in unix milliseconds.
    pub created_at: i64,
}

/// Decode a stored message document into its identifier and entity.
pub fn decode_message(doc: &StoredDocument) -> StorageResult<(String, ChatMessageEntity)> {
    let entity = serde_json::from_value(doc.data.clone())
        .map_err(|source| StorageError::codec(format!("messages/{}", doc.id), source))?;
    Ok((doc.id.clone(), entity))
}

/// Data access for per-room chat messages.
#[derive(Clone)]
pub struct ChatRepository {
    store: Arc<dyn DocumentStore>,
}

impl ChatRepository {
    /// Wrap the shared document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a message to the room's log, returning the assigned id.
    pub async fn post(&self, room_id: Uuid, message: ChatMessageEntity) -> StorageResult<String> {
        let collection = paths::room_messages(room_id);
        let data = serde_json::to_value(&message)
            .map_err(|source| StorageError::codec(collection.clone(), source))?;
        self.store.add_document(&collection, data).await
    }

    /// Fetch the `limit` most recent messages, newest first.
    ///
    /// Callers reverse the result before display so readers see the log
    /// oldest-to-newest.
    pub async fn latest(
        &self,
        room_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<(String, ChatMessageEntity)>> {
        let docs = self
            .store
            .query_collection(Self::latest_query(room_id, limit))
            .await?;
        docs.iter().map(decode_message).collect()
    }

    /// Subscribe to the `limit` most recent messages of the room.
    pub async fn subscribe(&self, room_id: Uuid, limit: usize) -> StorageResult<Subscription> {
        self.store
            .subscribe(WatchTarget::Query(Self::latest_query(room_id, limit)))
            .await
    }

    fn latest_query(room_id: Uuid, limit: usize) -> CollectionQuery {
        CollectionQuery::all(paths::room_messages(room_id))
            .order_by("createdAt", Direction::Descending)
            .limit(limit)
    }
}

#[cfg(test)]
mod tests {
    use crate::dao::memory::MemoryStore;

    use super::*;

    fn message(text: &str, created_at: i64) -> ChatMessageEntity {
        ChatMessageEntity {
            text: text.into(),
            user_id: "u1".into(),
            username: "ada".into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn latest_returns_newest_first_and_limits() {
        let repo = ChatRepository::new(Arc::new(MemoryStore::new()));
        let room_id = Uuid::new_v4();

        for (text, at) in [("one", 1), ("two", 2), ("three", 3)] {
            repo.post(room_id, message(text, at)).await.unwrap();
        }

        let latest = repo.latest(room_id, 2).await.unwrap();
        let texts: Vec<_> = latest.iter().map(|(_, m)| m.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn logs_are_scoped_per_room() {
        let repo = ChatRepository::new(Arc::new(MemoryStore::new()));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        repo.post(a, message("in a", 1)).await.unwrap();

        assert_eq!(repo.latest(a, 50).await.unwrap().len(), 1);
        assert!(repo.latest(b, 50).await.unwrap().is_empty());
    }
}
