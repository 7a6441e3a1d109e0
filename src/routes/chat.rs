use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::chat::{ChatMessageView, PostMessageRequest},
    error::AppError,
    identity::CurrentUser,
    services::chat_service,
    state::SharedState,
};

/// Routes handling the per-room chat log.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/rooms/{id}/messages",
        post(post_message).get(latest_messages),
    )
}

/// Append a message to the room's chat log.
#[utoipa::path(
    post,
    path = "/rooms/{id}/messages",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = ChatMessageView),
        (status = 401, description = "Missing identity"),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PostMessageRequest>>,
) -> Result<Json<ChatMessageView>, AppError> {
    let message = chat_service::post_message(&state, &user, id, payload).await?;
    Ok(Json(message))
}

/// The most recent messages of a room, oldest first.
#[utoipa::path(
    get,
    path = "/rooms/{id}/messages",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses((status = 200, description = "Recent messages, oldest first", body = [ChatMessageView]))
)]
pub async fn latest_messages(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessageView>>, AppError> {
    let messages = chat_service::latest_messages(&state, id).await?;
    Ok(Json(messages))
}
