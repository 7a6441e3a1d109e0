//! In-process [`DocumentStore`] backend.
//!
//! Documents are JSON objects grouped into slash-separated collections.
//! Insertion order is commit order. Every mutation re-evaluates the watchers
//! registered against the touched collection and pushes them a full snapshot,
//! so subscribers never have to diff partial updates.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::{
    document_store::{
        ChangePayload, CollectionQuery, Direction, DocumentStore, StoredDocument, Subscription,
        WatchTarget,
    },
    storage::{StorageError, StorageResult},
};

const WATCH_CHANNEL_CAPACITY: usize = 16;

/// In-memory document store with push-based change notification.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    collections: DashMap<String, IndexMap<String, Value>>,
    watchers: DashMap<u64, Watcher>,
    watcher_ids: AtomicU64,
}

struct Watcher {
    target: WatchTarget,
    sender: broadcast::Sender<ChangePayload>,
}

/// Removes the watcher registration when the owning [`Subscription`] drops.
struct WatchGuard {
    id: u64,
    inner: Weak<MemoryInner>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.watchers.remove(&self.id);
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn get(&self, collection: &str, id: &str) -> Option<StoredDocument> {
        let docs = self.collections.get(collection)?;
        docs.get(id).map(|data| StoredDocument {
            id: id.to_string(),
            data: data.clone(),
        })
    }

    fn evaluate(&self, query: &CollectionQuery) -> Vec<StoredDocument> {
        let Some(docs) = self.collections.get(&query.collection) else {
            return Vec::new();
        };

        // Commit (insertion) order doubles as the tie-breaker, so documents
        // with equal order-field values still sort deterministically.
        let mut results: Vec<(usize, StoredDocument)> = docs
            .iter()
            .filter(|(_, data)| {
                query
                    .filters
                    .iter()
                    .all(|filter| field_of(data, &filter.field) == Some(&filter.equals))
            })
            .enumerate()
            .map(|(position, (id, data))| {
                (
                    position,
                    StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    },
                )
            })
            .collect();
        drop(docs);

        if let Some(order) = &query.order_by {
            results.sort_by(|(position_a, a), (position_b, b)| {
                let ordering =
                    cmp_values(field_of(&a.data, &order.field), field_of(&b.data, &order.field))
                        .then(position_a.cmp(position_b));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        results.into_iter().map(|(_, doc)| doc).collect()
    }

    /// Push fresh snapshots to every watcher observing `collection`.
    ///
    /// Must not be called while a shard of `collections` is held mutably.
    fn notify(&self, collection: &str) {
        for watcher in self.watchers.iter() {
            let payload = match &watcher.target {
                WatchTarget::Document(path) => {
                    let Ok((doc_collection, id)) = split_document_path(path) else {
                        continue;
                    };
                    if doc_collection != collection {
                        continue;
                    }
                    ChangePayload::Document(self.get(doc_collection, id))
                }
                WatchTarget::Query(query) => {
                    if query.collection != collection {
                        continue;
                    }
                    ChangePayload::QueryResults(self.evaluate(query))
                }
            };

            let _ = watcher.sender.send(payload);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get_document(&self, path: &str) -> BoxFuture<'static, StorageResult<Option<StoredDocument>>> {
        let inner = self.inner.clone();
        let path = path.to_string();
        Box::pin(async move {
            let (collection, id) = split_document_path(&path)?;
            Ok(inner.get(collection, id))
        })
    }

    fn set_document(
        &self,
        path: &str,
        data: Value,
        merge: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let path = path.to_string();
        Box::pin(async move {
            let (collection, id) = split_document_path(&path)?;
            {
                let mut docs = inner.collections.entry(collection.to_string()).or_default();
                match docs.get_mut(id) {
                    Some(existing) if merge => merge_fields(existing, data),
                    Some(existing) => *existing = data,
                    None => {
                        docs.insert(id.to_string(), data);
                    }
                }
            }
            inner.notify(collection);
            Ok(())
        })
    }

    fn add_document(
        &self,
        collection: &str,
        data: Value,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let inner = self.inner.clone();
        let collection = collection.to_string();
        Box::pin(async move {
            let id = Uuid::new_v4().simple().to_string();
            {
                let mut docs = inner.collections.entry(collection.clone()).or_default();
                docs.insert(id.clone(), data);
            }
            inner.notify(&collection);
            Ok(id)
        })
    }

    fn delete_document(&self, path: &str) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let path = path.to_string();
        Box::pin(async move {
            let (collection, id) = split_document_path(&path)?;
            let removed = inner
                .collections
                .get_mut(collection)
                .and_then(|mut docs| docs.shift_remove(id));
            if removed.is_some() {
                inner.notify(collection);
            }
            Ok(())
        })
    }

    fn query_collection(
        &self,
        query: CollectionQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<StoredDocument>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.evaluate(&query)) })
    }

    fn subscribe(&self, target: WatchTarget) -> BoxFuture<'static, StorageResult<Subscription>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let initial = match &target {
                WatchTarget::Document(path) => {
                    let (collection, id) = split_document_path(path)?;
                    ChangePayload::Document(inner.get(collection, id))
                }
                WatchTarget::Query(query) => ChangePayload::QueryResults(inner.evaluate(query)),
            };

            let (sender, receiver) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
            let id = inner.watcher_ids.fetch_add(1, Ordering::Relaxed);
            inner.watchers.insert(id, Watcher { target, sender });

            let guard = WatchGuard {
                id,
                inner: Arc::downgrade(&inner),
            };

            Ok(Subscription::new(initial, receiver, Box::new(guard)))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Split a document path into its collection prefix and document id.
fn split_document_path(path: &str) -> StorageResult<(&str, &str)> {
    match path.rsplit_once('/') {
        Some((collection, id)) if !collection.is_empty() && !id.is_empty() => Ok((collection, id)),
        _ => Err(StorageError::InvalidPath {
            path: path.to_string(),
        }),
    }
}

fn field_of<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    data.as_object().and_then(|object| object.get(field))
}

/// Shallow-merge the top-level fields of `incoming` into `existing`.
fn merge_fields(existing: &mut Value, incoming: Value) {
    match (existing.as_object_mut(), incoming) {
        (Some(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        (_, incoming) => *existing = incoming,
    }
}

/// Order JSON values for query sorting: null < bool < number < string.
fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn query_by_created(collection: &str, direction: Direction) -> CollectionQuery {
        CollectionQuery::all(collection).order_by("createdAt", direction)
    }

    #[tokio::test]
    async fn set_with_merge_preserves_sibling_fields() {
        let store = MemoryStore::new();
        store
            .set_document("users/u1", json!({"highestScore": 3, "displayName": "ada"}), false)
            .await
            .unwrap();
        store
            .set_document("users/u1", json!({"highestScore": 7}), true)
            .await
            .unwrap();

        let doc = store.get_document("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"highestScore": 7, "displayName": "ada"}));
    }

    #[tokio::test]
    async fn set_without_merge_replaces_document() {
        let store = MemoryStore::new();
        store
            .set_document("users/u1", json!({"highestScore": 3, "displayName": "ada"}), false)
            .await
            .unwrap();
        store
            .set_document("users/u1", json!({"highestScore": 1}), false)
            .await
            .unwrap();

        let doc = store.get_document("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"highestScore": 1}));
    }

    #[tokio::test]
    async fn query_orders_and_limits() {
        let store = MemoryStore::new();
        for (i, created) in [(0, 10), (1, 30), (2, 20)] {
            store
                .add_document("rooms/r1/messages", json!({"text": format!("m{i}"), "createdAt": created}))
                .await
                .unwrap();
        }

        let newest_two = store
            .query_collection(query_by_created("rooms/r1/messages", Direction::Descending).limit(2))
            .await
            .unwrap();
        let texts: Vec<_> = newest_two
            .iter()
            .map(|doc| doc.data["text"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn equality_filters_apply() {
        let store = MemoryStore::new();
        store
            .add_document("rooms", json!({"name": "a", "gameStarted": false}))
            .await
            .unwrap();
        store
            .add_document("rooms", json!({"name": "b", "gameStarted": true}))
            .await
            .unwrap();

        let mut query = CollectionQuery::all("rooms");
        query.filters.push(crate::dao::document_store::FieldFilter {
            field: "gameStarted".into(),
            equals: json!(true),
        });

        let started = store.query_collection(query).await.unwrap();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].data["name"], json!("b"));
    }

    #[tokio::test]
    async fn document_subscription_delivers_initial_and_updates() {
        let store = MemoryStore::new();
        store
            .set_document("rooms/r1", json!({"name": "lobby", "players": []}), false)
            .await
            .unwrap();

        let mut sub = store
            .subscribe(WatchTarget::Document("rooms/r1".into()))
            .await
            .unwrap();

        let ChangePayload::Document(Some(initial)) = sub.recv().await.unwrap() else {
            panic!("expected initial document snapshot");
        };
        assert_eq!(initial.data["name"], json!("lobby"));

        store
            .set_document("rooms/r1", json!({"players": ["u1"]}), true)
            .await
            .unwrap();

        let ChangePayload::Document(Some(updated)) = sub.recv().await.unwrap() else {
            panic!("expected updated document snapshot");
        };
        assert_eq!(updated.data["players"], json!(["u1"]));
        assert_eq!(updated.data["name"], json!("lobby"));
    }

    #[tokio::test]
    async fn query_subscription_reevaluates_on_append() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe(WatchTarget::Query(query_by_created(
                "rooms/r1/messages",
                Direction::Descending,
            )))
            .await
            .unwrap();

        assert_eq!(sub.recv().await.unwrap(), ChangePayload::QueryResults(Vec::new()));

        store
            .add_document("rooms/r1/messages", json!({"text": "hi", "createdAt": 1}))
            .await
            .unwrap();

        let ChangePayload::QueryResults(results) = sub.recv().await.unwrap() else {
            panic!("expected query results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data["text"], json!("hi"));
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_watcher() {
        let store = MemoryStore::new();
        let sub = store
            .subscribe(WatchTarget::Document("rooms/r1".into()))
            .await
            .unwrap();
        assert_eq!(store.inner.watchers.len(), 1);

        drop(sub);
        assert_eq!(store.inner.watchers.len(), 0);
    }

    #[tokio::test]
    async fn delete_notifies_with_absent_document() {
        let store = MemoryStore::new();
        store
            .set_document("questions/q1", json!({"text": "?"}), false)
            .await
            .unwrap();

        let mut sub = store
            .subscribe(WatchTarget::Document("questions/q1".into()))
            .await
            .unwrap();
        sub.recv().await.unwrap();

        store.delete_document("questions/q1").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), ChangePayload::Document(None));
    }

    #[tokio::test]
    async fn invalid_path_is_rejected() {
        let store = MemoryStore::new();
        let err = store.get_document("rooms").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath { .. }));
    }
}
