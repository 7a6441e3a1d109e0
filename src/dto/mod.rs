use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Chat request/response payloads.
pub mod chat;
/// Snapshots shared between REST responses and SSE events.
pub mod common;
/// Game session payloads.
pub mod game;
/// Health check payload.
pub mod health;
/// Question bank payloads.
pub mod questions;
/// Room payloads.
pub mod room;
/// Server-sent event envelope and payloads.
pub mod sse;

/// Render a unix-millisecond timestamp as RFC 3339 for API consumers.
fn format_unix_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|timestamp| timestamp.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
