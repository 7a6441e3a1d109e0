//! Data access layer: storage abstraction, in-memory backend, and typed
//! repositories over the shared document store.

/// Per-room chat log repository.
pub mod chat;
/// Document store capability trait and query/subscription types.
pub mod document_store;
/// In-process document store backend.
pub mod memory;
/// Admin question bank repository.
pub mod questions;
/// Room document repository.
pub mod rooms;
/// Per-user best score gateway.
pub mod scores;
/// Storage error definitions shared by every backend.
pub mod storage;

use time::OffsetDateTime;

/// Current wall-clock time as unix milliseconds, the timestamp unit used in
/// persisted documents.
pub fn unix_millis_now() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
