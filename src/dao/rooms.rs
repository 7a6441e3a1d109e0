//! Repository for room documents at `rooms/{roomId}`.

use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::{
    document_store::{
        CollectionQuery, DocumentStore, StoredDocument, Subscription, WatchTarget, paths,
    },
    storage::{StorageError, StorageResult},
};

/// Persisted representation of a multiplayer room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntity {
    /// Human readable room name.
    pub name: String,
    /// Uid of the user that created the room.
    pub created_by: String,
    /// Creation timestamp in unix milliseconds.
    pub created_at: i64,
    /// Uids of players that joined, in join order. Set semantics: joining
    /// twice leaves the roster untouched.
    #[serde(default)]
    pub players: IndexSet<String>,
    /// Whether a game round is currently running in this room.
    #[serde(default)]
    pub game_started: bool,
}

impl RoomEntity {
    /// Fresh room shell owned by `created_by`.
    pub fn new(name: String, created_by: String, created_at: i64) -> Self {
        Self {
            name,
            created_by,
            created_at,
            players: IndexSet::new(),
            game_started: false,
        }
    }
}

/// Decode a stored room document into its identifier and entity.
pub fn decode_room(doc: &StoredDocument) -> StorageResult<(Uuid, RoomEntity)> {
    let id = doc.id.parse::<Uuid>().map_err(|_| StorageError::InvalidPath {
        path: format!("{}/{}", paths::ROOMS, doc.id),
    })?;
    let entity = serde_json::from_value(doc.data.clone())
        .map_err(|source| StorageError::codec(paths::room(id), source))?;
    Ok((id, entity))
}

/// Data access for room documents.
#[derive(Clone)]
pub struct RoomRepository {
    store: Arc<dyn DocumentStore>,
}

impl RoomRepository {
    /// Wrap the shared document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new room under a fresh identifier.
    pub async fn create(&self, room: RoomEntity) -> StorageResult<Uuid> {
        let id = Uuid::new_v4();
        let data = serde_json::to_value(&room)
            .map_err(|source| StorageError::codec(paths::room(id), source))?;
        self.store.set_document(&paths::room(id), data, false).await?;
        Ok(id)
    }

    /// Fetch a room by id.
    pub async fn find(&self, id: Uuid) -> StorageResult<Option<RoomEntity>> {
        let Some(doc) = self.store.get_document(&paths::room(id)).await? else {
            return Ok(None);
        };
        serde_json::from_value(doc.data)
            .map(Some)
            .map_err(|source| StorageError::codec(paths::room(id), source))
    }

    /// List every room in creation order.
    pub async fn list(&self) -> StorageResult<Vec<(Uuid, RoomEntity)>> {
        let docs = self
            .store
            .query_collection(CollectionQuery::all(paths::ROOMS))
            .await?;
        docs.iter().map(decode_room).collect()
    }

    /// Add `uid` to the room's player set.
    ///
    /// Duplicate joins leave the stored document untouched. Returns the room
    /// state after the join, or `None` when the room does not exist.
    pub async fn join(&self, id: Uuid, uid: &str) -> StorageResult<Option<RoomEntity>> {
        let Some(mut room) = self.find(id).await? else {
            return Ok(None);
        };

        if room.players.insert(uid.to_string()) {
            let players = serde_json::to_value(&room.players)
                .map_err(|source| StorageError::codec(paths::room(id), source))?;
            self.store
                .set_document(
                    &paths::room(id),
                    serde_json::json!({ "players": players }),
                    true,
                )
                .await?;
        }

        Ok(Some(room))
    }

    /// Toggle the `gameStarted` flag via a merge write.
    pub async fn set_game_started(&self, id: Uuid, started: bool) -> StorageResult<()> {
        self.store
            .set_document(
                &paths::room(id),
                serde_json::json!({ "gameStarted": started }),
                true,
            )
            .await
    }

    /// Subscribe to full snapshots of the room document.
    pub async fn subscribe(&self, id: Uuid) -> StorageResult<Subscription> {
        self.store
            .subscribe(WatchTarget::Document(paths::room(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::dao::{document_store::ChangePayload, memory::MemoryStore};

    use super::*;

    fn repository() -> RoomRepository {
        RoomRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let repo = repository();
        let room = RoomEntity::new("lobby".into(), "u1".into(), 1_000);
        let id = repo.create(room.clone()).await.unwrap();

        let found = repo.find(id).await.unwrap().unwrap();
        assert_eq!(found, room);
    }

    #[tokio::test]
    async fn duplicate_join_is_a_no_op() {
        let repo = repository();
        let id = repo
            .create(RoomEntity::new("lobby".into(), "u1".into(), 1_000))
            .await
            .unwrap();

        repo.join(id, "u2").await.unwrap().unwrap();
        let after_second = repo.join(id, "u2").await.unwrap().unwrap();

        assert_eq!(after_second.players.len(), 1);
        assert!(after_second.players.contains("u2"));
    }

    #[tokio::test]
    async fn join_missing_room_returns_none() {
        let repo = repository();
        assert!(repo.join(Uuid::new_v4(), "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn game_started_merge_preserves_roster() {
        let repo = repository();
        let id = repo
            .create(RoomEntity::new("lobby".into(), "u1".into(), 1_000))
            .await
            .unwrap();
        repo.join(id, "u2").await.unwrap();

        repo.set_game_started(id, true).await.unwrap();

        let room = repo.find(id).await.unwrap().unwrap();
        assert!(room.game_started);
        assert!(room.players.contains("u2"));
    }

    #[tokio::test]
    async fn subscription_sees_each_join() {
        let repo = repository();
        let id = repo
            .create(RoomEntity::new("lobby".into(), "u1".into(), 1_000))
            .await
            .unwrap();

        let mut sub = repo.subscribe(id).await.unwrap();
        // Initial snapshot.
        sub.recv().await.unwrap();

        repo.join(id, "u2").await.unwrap();

        let ChangePayload::Document(Some(doc)) = sub.recv().await.unwrap() else {
            panic!("expected room snapshot");
        };
        let (_, room) = decode_room(&doc).unwrap();
        assert!(room.players.contains("u2"));
    }
}
