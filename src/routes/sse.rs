use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    identity::CurrentUser,
    services::{sse_events, sse_service},
    state::SharedState,
};

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/rooms/{id}", get(room_stream))
        .route("/sse/game", get(game_stream))
}

#[utoipa::path(
    get,
    path = "/sse/rooms/{id}",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses((status = 200, description = "Room and chat live stream", content_type = "text/event-stream", body = String))
)]
/// Stream room snapshots and chat history to a connected client.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let stream = sse_service::room_stream(&state, id).await?;
    info!(%id, "new room SSE connection");
    Ok(stream)
}

#[utoipa::path(
    get,
    path = "/sse/game",
    tag = "sse",
    responses((status = 200, description = "Caller's session event stream", content_type = "text/event-stream", body = String))
)]
/// Stream session events (questions, ticks, endings) to the caller.
pub async fn game_stream(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_session(&state, &user.uid);
    info!(uid = %user.uid, "new game SSE connection");
    sse_events::broadcast_session_info(&state, &user.uid, "game stream connected");
    sse_service::to_sse_stream(receiver, "game")
}
