//! Abstraction over the shared document store consumed by the repositories.
//!
//! The store exposes the minimal capability set the application relies on:
//! point reads, writes with optional field merging, collection queries, and
//! push-based change subscriptions delivering full snapshots.

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::dao::storage::StorageResult;

/// A document as returned by the store: its identifier plus the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Identifier of the document inside its collection.
    pub id: String,
    /// JSON object payload.
    pub data: Value,
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest field value first.
    Ascending,
    /// Largest field value first.
    Descending,
}

/// Ordering clause applied to a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field the results are sorted on.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Equality filter applied to a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Field to compare.
    pub field: String,
    /// Value the field must equal.
    pub equals: Value,
}

/// Declarative query over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    /// Slash-separated collection path (e.g. `rooms/{id}/messages`).
    pub collection: String,
    /// Equality filters, all of which must match.
    pub filters: Vec<FieldFilter>,
    /// Optional ordering clause.
    pub order_by: Option<OrderBy>,
    /// Optional bound on the number of returned documents.
    pub limit: Option<usize>,
}

impl CollectionQuery {
    /// Query returning every document of `collection` in commit order.
    pub fn all(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add an ordering clause.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Bound the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// What a subscription observes: a single document or a whole query.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchTarget {
    /// Full snapshot of one document on every change.
    Document(String),
    /// Re-evaluated result set of a query on every change to its collection.
    Query(CollectionQuery),
}

/// Snapshot pushed to subscribers whenever the watched target changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangePayload {
    /// Current state of the watched document, `None` once deleted.
    Document(Option<StoredDocument>),
    /// Current result set of the watched query, in query order.
    QueryResults(Vec<StoredDocument>),
}

/// Error returned when receiving from a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    /// The store dropped the subscription (backend shut down).
    #[error("subscription closed by the store")]
    Closed,
    /// The receiver fell behind and missed `0` or more snapshots.
    ///
    /// Snapshots are full-state, so the next received payload supersedes
    /// anything that was skipped.
    #[error("subscription lagged behind the store")]
    Lagged,
}

/// Live change feed for a [`WatchTarget`].
///
/// The first received payload is the snapshot taken at subscription time.
/// Dropping the subscription unregisters the watcher.
pub struct Subscription {
    initial: Option<ChangePayload>,
    receiver: broadcast::Receiver<ChangePayload>,
    _guard: Box<dyn Send + Sync>,
}

impl Subscription {
    /// Assemble a subscription from its initial snapshot, receiver, and an
    /// opaque guard whose drop unregisters the watcher.
    pub fn new(
        initial: ChangePayload,
        receiver: broadcast::Receiver<ChangePayload>,
        guard: Box<dyn Send + Sync>,
    ) -> Self {
        Self {
            initial: Some(initial),
            receiver,
            _guard: guard,
        }
    }

    /// Wait for the next snapshot.
    pub async fn recv(&mut self) -> Result<ChangePayload, SubscriptionError> {
        if let Some(initial) = self.initial.take() {
            return Ok(initial);
        }

        match self.receiver.recv().await {
            Ok(payload) => Ok(payload),
            Err(broadcast::error::RecvError::Closed) => Err(SubscriptionError::Closed),
            Err(broadcast::error::RecvError::Lagged(_)) => Err(SubscriptionError::Lagged),
        }
    }
}

/// Capability interface over the shared document store.
///
/// Implementations must deliver each single subscription's updates in commit
/// order; no ordering is guaranteed across distinct subscriptions.
pub trait DocumentStore: Send + Sync {
    /// Read a document, returning `None` when absent.
    fn get_document(&self, path: &str) -> BoxFuture<'static, StorageResult<Option<StoredDocument>>>;
    /// Write a document. With `merge`, top-level fields are merged into the
    /// existing payload instead of replacing it wholesale.
    fn set_document(&self, path: &str, data: Value, merge: bool)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Append a document with a store-assigned identifier, returning the id.
    fn add_document(&self, collection: &str, data: Value)
    -> BoxFuture<'static, StorageResult<String>>;
    /// Delete a document; deleting an absent document is a no-op.
    fn delete_document(&self, path: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Run a collection query.
    fn query_collection(
        &self,
        query: CollectionQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<StoredDocument>>>;
    /// Register a change watcher for `target`.
    fn subscribe(&self, target: WatchTarget) -> BoxFuture<'static, StorageResult<Subscription>>;
    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Store path helpers mirroring the persisted layout.
pub mod paths {
    use uuid::Uuid;

    /// Top-level room collection.
    pub const ROOMS: &str = "rooms";
    /// Top-level admin question bank collection.
    pub const QUESTIONS: &str = "questions";
    /// Top-level per-user score record collection.
    pub const USERS: &str = "users";

    /// Document path of a room.
    pub fn room(id: Uuid) -> String {
        format!("{ROOMS}/{id}")
    }

    /// Message sub-collection of a room.
    pub fn room_messages(id: Uuid) -> String {
        format!("{ROOMS}/{id}/messages")
    }

    /// Document path of a user's score record.
    pub fn user(uid: &str) -> String {
        format!("{USERS}/{uid}")
    }

    /// Document path of a question bank entry.
    pub fn question(id: &str) -> String {
        format!("{QUESTIONS}/{id}")
    }
}
