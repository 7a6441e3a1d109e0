//! SSE plumbing: bridging broadcast hubs and document-store subscriptions
//! into `axum` event streams with explicit teardown.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        chat::{ChatRepository, decode_message},
        document_store::{ChangePayload, SubscriptionError},
        rooms::{RoomRepository, decode_room},
    },
    dto::{
        chat::ChatMessageView,
        sse::{ChatHistoryEvent, RoomUpdatedEvent, ServerEvent},
    },
    error::ServiceError,
    state::SharedState,
};

const EVENT_ROOM_UPDATED: &str = "room.updated";
const EVENT_CHAT_HISTORY: &str = "chat.history";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const FORWARD_CHANNEL_CAPACITY: usize = 8;

/// Subscribe to the caller's session event hub.
pub fn subscribe_session(state: &SharedState, uid: &str) -> broadcast::Receiver<ServerEvent> {
    state.session_hub(uid).subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    label: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Small bounded channel between forwarder and response.
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(into_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        info!(label, "SSE stream disconnected");
    });

    sse_response(rx)
}

/// Live stream of a room: full room snapshots and the recent chat history.
///
/// Both feeds are store subscriptions owned by the forwarder task; when the
/// client disconnects (or the store closes the subscription) the task ends
/// and dropping the subscriptions unregisters the watchers. A client that
/// lost its stream recovers by reconnecting.
pub async fn room_stream(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let store = state.require_document_store().await?;

    let rooms = RoomRepository::new(store.clone());
    if rooms.find(room_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    }

    let mut room_sub = rooms.subscribe(room_id).await?;
    let mut chat_sub = ChatRepository::new(store)
        .subscribe(room_id, state.config().chat.history_limit)
        .await?;

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                payload = room_sub.recv() => {
                    match forwarded_payload(payload, room_event) {
                        Forward::Event(event) => {
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Forward::Skip => continue,
                        Forward::Stop => break,
                    }
                }
                payload = chat_sub.recv() => {
                    match forwarded_payload(payload, chat_event) {
                        Forward::Event(event) => {
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Forward::Skip => continue,
                        Forward::Stop => break,
                    }
                }
            }
        }

        info!(%room_id, "room SSE stream disconnected");
    });

    Ok(sse_response(rx))
}

enum Forward {
    Event(Event),
    Skip,
    Stop,
}

fn forwarded_payload(
    payload: Result<ChangePayload, SubscriptionError>,
    convert: fn(ChangePayload) -> Option<ServerEvent>,
) -> Forward {
    match payload {
        Ok(payload) => match convert(payload) {
            Some(event) => Forward::Event(into_event(event)),
            None => Forward::Skip,
        },
        // Snapshots are full-state; the next delivery supersedes whatever
        // was missed.
        Err(SubscriptionError::Lagged) => Forward::Skip,
        Err(SubscriptionError::Closed) => Forward::Stop,
    }
}

fn room_event(payload: ChangePayload) -> Option<ServerEvent> {
    let ChangePayload::Document(Some(doc)) = payload else {
        return None;
    };

    let room = match decode_room(&doc) {
        Ok(decoded) => RoomUpdatedEvent {
            room: decoded.into(),
        },
        Err(err) => {
            warn!(error = %err, "skipping undecodable room snapshot");
            return None;
        }
    };

    serialize_event(EVENT_ROOM_UPDATED, &room)
}

fn chat_event(payload: ChangePayload) -> Option<ServerEvent> {
    let ChangePayload::QueryResults(docs) = payload else {
        return None;
    };

    // Retrieval order is newest first; reverse for display.
    let mut messages: Vec<ChatMessageView> = docs
        .iter()
        .filter_map(|doc| match decode_message(doc) {
            Ok(decoded) => Some(decoded.into()),
            Err(err) => {
                warn!(error = %err, "skipping undecodable chat message");
                None
            }
        })
        .collect();
    messages.reverse();

    serialize_event(EVENT_CHAT_HISTORY, &ChatHistoryEvent { messages })
}

fn serialize_event(name: &str, payload: &impl serde::Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}

fn into_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

fn sse_response(
    rx: mpsc::Receiver<Result<Event, Infallible>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // The response stream reads from the mpsc channel; axum drops it when
    // the client disconnects, which closes the forwarder.
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
